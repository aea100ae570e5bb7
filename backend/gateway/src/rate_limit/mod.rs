//! Request rate limiting.
//!
//! Two interchangeable stores implement [`RateLimitStore`]: a shared Redis
//! sliding window ([`RedisStore`]) and a per-process map ([`MemoryStore`]).
//! [`RateLimiter`] prefers Redis when configured and silently degrades to the
//! in-process store whenever Redis errors, so a limiter check never fails.

mod memory;
mod redis_store;

pub use memory::{DEFAULT_MAX_KEYS, MemoryStore};
pub use redis_store::RedisStore;

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use folio_config::RateLimitConfig;
use folio_core::Clock;
use folio_logging::{EventLogger, RequestEvent};

/// A quota: at most `max_requests` per trailing `window_ms` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Tag that keeps each endpoint class on its own quota.
    pub name: &'static str,
    pub max_requests: u32,
    pub window_ms: i64,
}

impl RateLimitPolicy {
    pub const CHAT: Self = Self::new("chat", 10, 10_000);
    pub const CONTACT: Self = Self::new("contact", 5, 60_000);
    pub const NEWSLETTER: Self = Self::new("newsletter", 3, 60_000);
    pub const LOGIN: Self = Self::new("login", 5, 300_000);

    pub const fn new(name: &'static str, max_requests: u32, window_ms: i64) -> Self {
        Self {
            name,
            max_requests,
            window_ms,
        }
    }

    pub fn key(&self, identifier: &str) -> String {
        format!("ratelimit:{}:{}", self.name, identifier)
    }
}

/// Outcome of a single limiter check. `reset` is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitResult {
    pub success: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset: i64,
}

impl RateLimitResult {
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.reset).unwrap_or_else(Utc::now)
    }

    /// Whole seconds until `reset`, rounded up.
    pub fn retry_after_secs(&self, now_ms: i64) -> u64 {
        let wait_ms = (self.reset - now_ms).max(0) as u64;
        wait_ms.div_ceil(1000)
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit backend error: {0}")]
    Backend(String),

    #[error("rate limit backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("cannot connect to rate limit backend: {0}")]
    Connect(String),
}

/// Storage for per-key request timestamps.
///
/// `hit` prunes entries older than the policy window, decides admission, and
/// records `now_ms` when admitted, all as one atomic step per key.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn hit(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now_ms: i64,
    ) -> Result<RateLimitResult, RateLimitError>;
}

pub const DEFAULT_FALLBACK_COOLDOWN_MS: i64 = 30_000;

/// Limiter facade used by the route handlers.
pub struct RateLimiter {
    primary: Option<Arc<dyn RateLimitStore>>,
    fallback: Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
    cooldown_ms: i64,
    /// Epoch ms until which checks bypass the primary store.
    degraded_until: AtomicI64,
}

impl RateLimiter {
    /// A limiter backed only by the in-process store.
    pub fn in_memory(fallback: Arc<MemoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            primary: None,
            fallback,
            clock,
            cooldown_ms: DEFAULT_FALLBACK_COOLDOWN_MS,
            degraded_until: AtomicI64::new(i64::MIN),
        }
    }

    pub fn with_primary(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.primary = Some(store);
        self
    }

    pub fn with_cooldown_ms(mut self, cooldown_ms: i64) -> Self {
        self.cooldown_ms = cooldown_ms.max(0);
        self
    }

    /// Build from configuration: Redis + memory fallback when a Redis URL is
    /// set and reachable, memory only otherwise.
    pub async fn from_config(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let fallback = Arc::new(MemoryStore::new(config.memory_max_keys));
        let limiter = Self::in_memory(fallback, clock)
            .with_cooldown_ms(i64::try_from(config.fallback_cooldown_ms).unwrap_or(i64::MAX));

        let Some(url) = config.redis_url.as_deref() else {
            info!("Rate limiting uses the in-process store");
            return limiter;
        };

        let timeout = Duration::from_millis(config.redis_timeout_ms);
        match RedisStore::connect(url, config.redis_token.as_deref(), timeout).await {
            Ok(store) => {
                info!("Rate limiting uses Redis with in-process fallback");
                limiter.with_primary(Arc::new(store))
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable at startup, rate limiting uses the in-process store");
                limiter
            }
        }
    }

    /// Which store currently answers checks.
    pub fn backend(&self) -> &'static str {
        match &self.primary {
            Some(store) if !self.is_degraded(self.clock.now_ms()) => store.name(),
            Some(_) => "memory-fallback",
            None => self.fallback.name(),
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    fn is_degraded(&self, now_ms: i64) -> bool {
        now_ms < self.degraded_until.load(Ordering::Relaxed)
    }

    /// Count a request from `identifier` against `policy`. Never fails.
    pub async fn check(&self, identifier: &str, policy: &RateLimitPolicy) -> RateLimitResult {
        let key = policy.key(identifier);
        let now = self.clock.now_ms();

        if let Some(primary) = &self.primary {
            if !self.is_degraded(now) {
                match primary.hit(&key, policy, now).await {
                    Ok(result) => {
                        debug!(key = %key, store = primary.name(), allowed = result.success, remaining = result.remaining, "Rate limit check");
                        return result;
                    }
                    Err(e) => {
                        warn!(key = %key, store = primary.name(), error = %e, "Rate limit store failed, falling back to in-process store");
                        EventLogger::log(
                            policy.name,
                            RequestEvent::LimiterFallback {
                                store: primary.name().to_string(),
                                error: e.to_string(),
                            },
                        );
                        self.degraded_until
                            .store(now.saturating_add(self.cooldown_ms), Ordering::Relaxed);
                    }
                }
            }
        }

        let result = self.fallback.check(&key, policy, now).await;
        debug!(key = %key, store = self.fallback.name(), allowed = result.success, remaining = result.remaining, "Rate limit check");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::ManualClock;
    use std::sync::atomic::AtomicUsize;

    const START: i64 = 1_700_000_000_000;

    struct FailingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RateLimitStore for FailingStore {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn hit(
            &self,
            _key: &str,
            _policy: &RateLimitPolicy,
            _now_ms: i64,
        ) -> Result<RateLimitResult, RateLimitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RateLimitError::Backend("connection reset".into()))
        }
    }

    fn limiter() -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let limiter = RateLimiter::in_memory(Arc::new(MemoryStore::new(100)), clock.clone());
        (limiter, clock)
    }

    #[tokio::test]
    async fn chat_quota_counts_down_then_denies() {
        let (limiter, clock) = limiter();

        for expected in (0..10).rev() {
            let result = limiter.check("1.2.3.4", &RateLimitPolicy::CHAT).await;
            assert!(result.success);
            assert_eq!(result.limit, 10);
            assert_eq!(result.remaining, expected);
            clock.advance_ms(200);
        }

        let denied = limiter.check("1.2.3.4", &RateLimitPolicy::CHAT).await;
        assert!(!denied.success);
        assert_eq!(denied.limit, 10);
        assert_eq!(denied.remaining, 0);

        let now = clock.now_ms();
        assert!(denied.reset > now);
        assert!(denied.reset <= now + RateLimitPolicy::CHAT.window_ms);
        // The first request ages out first.
        assert_eq!(denied.reset, START + RateLimitPolicy::CHAT.window_ms);
    }

    #[tokio::test]
    async fn quota_replenishes_after_window() {
        let (limiter, clock) = limiter();
        let policy = RateLimitPolicy::new("test", 3, 1_000);

        for _ in 0..3 {
            assert!(limiter.check("id", &policy).await.success);
        }
        assert!(!limiter.check("id", &policy).await.success);

        clock.advance_ms(1_000);
        let result = limiter.check("id", &policy).await;
        assert!(result.success);
        assert_eq!(result.remaining, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_burst_admits_exactly_the_quota() {
        let (limiter, _clock) = limiter();
        let limiter = Arc::new(limiter);

        let handles: Vec<_> = (0..200)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.check("1.2.3.4", &RateLimitPolicy::CHAT).await.success
                })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, RateLimitPolicy::CHAT.max_requests);

        let after = limiter.check("1.2.3.4", &RateLimitPolicy::CHAT).await;
        assert!(!after.success);
        assert_eq!(after.remaining, 0);
    }

    #[tokio::test]
    async fn endpoint_classes_have_independent_quotas() {
        let (limiter, _clock) = limiter();

        for _ in 0..10 {
            limiter.check("9.9.9.9", &RateLimitPolicy::CHAT).await;
        }
        assert!(!limiter.check("9.9.9.9", &RateLimitPolicy::CHAT).await.success);

        let contact = limiter.check("9.9.9.9", &RateLimitPolicy::CONTACT).await;
        assert!(contact.success);
        assert_eq!(contact.remaining, 4);
    }

    #[tokio::test]
    async fn failing_primary_falls_back_and_stays_on_memory_during_cooldown() {
        let clock = Arc::new(ManualClock::new(START));
        let failing = Arc::new(FailingStore {
            calls: AtomicUsize::new(0),
        });
        let limiter = RateLimiter::in_memory(Arc::new(MemoryStore::new(100)), clock.clone())
            .with_primary(failing.clone())
            .with_cooldown_ms(5_000);

        let first = limiter.check("5.6.7.8", &RateLimitPolicy::CONTACT).await;
        assert!(first.success);
        assert_eq!(first.remaining, 4);
        assert_eq!(limiter.backend(), "memory-fallback");

        let second = limiter.check("5.6.7.8", &RateLimitPolicy::CONTACT).await;
        assert_eq!(second.remaining, 3);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);

        clock.advance_ms(5_000);
        let third = limiter.check("5.6.7.8", &RateLimitPolicy::CONTACT).await;
        assert!(third.success);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn from_config_without_redis_is_memory_only() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(START));
        let limiter = RateLimiter::from_config(&RateLimitConfig::default(), clock).await;
        assert_eq!(limiter.backend(), "memory");
    }

    #[test]
    fn retry_after_rounds_up() {
        let result = RateLimitResult {
            success: false,
            limit: 5,
            remaining: 0,
            reset: START + 1_001,
        };
        assert_eq!(result.retry_after_secs(START), 2);
        assert_eq!(result.retry_after_secs(START + 5_000), 0);
        assert_eq!(result.reset_at().timestamp_millis(), START + 1_001);
    }

    #[test]
    fn keys_are_namespaced_by_policy() {
        assert_eq!(RateLimitPolicy::CHAT.key("1.2.3.4"), "ratelimit:chat:1.2.3.4");
        assert_ne!(
            RateLimitPolicy::CHAT.key("x"),
            RateLimitPolicy::CONTACT.key("x")
        );
    }
}
