use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{RateLimitError, RateLimitPolicy, RateLimitResult, RateLimitStore};

pub const DEFAULT_MAX_KEYS: usize = 10_000;

#[derive(Debug, Default)]
struct Record {
    timestamps: Vec<i64>,
    window_ms: i64,
    touched_ms: i64,
}

impl Record {
    fn is_expired(&self, now_ms: i64) -> bool {
        self.timestamps
            .iter()
            .all(|&t| t <= now_ms - self.window_ms)
    }
}

/// Per-process sliding-window store.
///
/// Holds at most `max_keys` records. When a new key arrives at capacity,
/// fully expired records are swept first, then the least recently touched
/// record is evicted.
pub struct MemoryStore {
    records: Mutex<HashMap<String, Record>>,
    max_keys: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KEYS)
    }
}

impl MemoryStore {
    pub fn new(max_keys: usize) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            max_keys: max_keys.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Drop every record with no timestamps left inside its window.
    pub async fn cleanup(&self, now_ms: i64) -> usize {
        let mut records = self.records.lock().await;
        sweep(&mut records, now_ms)
    }

    pub async fn check(&self, key: &str, policy: &RateLimitPolicy, now_ms: i64) -> RateLimitResult {
        let mut records = self.records.lock().await;

        if !records.contains_key(key) && records.len() >= self.max_keys {
            make_room(&mut records, now_ms);
        }

        let record = records.entry(key.to_string()).or_default();
        let window_start = now_ms - policy.window_ms;
        record.timestamps.retain(|&t| t > window_start);
        record.window_ms = policy.window_ms;
        record.touched_ms = now_ms;

        let limit = policy.max_requests;
        let count = record.timestamps.len();

        if count >= limit as usize {
            let oldest = record.timestamps.iter().copied().min().unwrap_or(now_ms);
            return RateLimitResult {
                success: false,
                limit,
                remaining: 0,
                reset: oldest + policy.window_ms,
            };
        }

        record.timestamps.push(now_ms);
        RateLimitResult {
            success: true,
            limit,
            remaining: limit.saturating_sub(record.timestamps.len() as u32),
            reset: now_ms + policy.window_ms,
        }
    }
}

fn sweep(records: &mut HashMap<String, Record>, now_ms: i64) -> usize {
    let before = records.len();
    records.retain(|_, record| !record.is_expired(now_ms));
    before - records.len()
}

fn make_room(records: &mut HashMap<String, Record>, now_ms: i64) {
    let swept = sweep(records, now_ms);
    if swept > 0 {
        debug!(swept, "Swept expired rate limit records");
        return;
    }

    let stalest = records
        .iter()
        .min_by_key(|(_, record)| record.touched_ms)
        .map(|(key, _)| key.clone());
    if let Some(key) = stalest {
        debug!(key = %key, "Evicting least recently used rate limit record");
        records.remove(&key);
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn hit(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now_ms: i64,
    ) -> Result<RateLimitResult, RateLimitError> {
        Ok(self.check(key, policy, now_ms).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: RateLimitPolicy = RateLimitPolicy::new("test", 2, 1_000);

    #[tokio::test]
    async fn denial_reset_points_at_oldest_request() {
        let store = MemoryStore::new(10);
        store.check("k", &POLICY, 0).await;
        store.check("k", &POLICY, 400).await;

        let denied = store.check("k", &POLICY, 700).await;
        assert!(!denied.success);
        assert_eq!(denied.reset, 1_000);

        // First timestamp leaves the window exactly at t = 1000.
        let admitted = store.check("k", &POLICY, 1_000).await;
        assert!(admitted.success);
        assert_eq!(admitted.remaining, 0);
        assert_eq!(admitted.reset, 2_000);
    }

    #[tokio::test]
    async fn denied_requests_are_not_recorded() {
        let store = MemoryStore::new(10);
        store.check("k", &POLICY, 0).await;
        store.check("k", &POLICY, 0).await;
        for t in [100, 200, 300] {
            assert!(!store.check("k", &POLICY, t).await.success);
        }
        assert!(store.check("k", &POLICY, 1_000).await.success);
    }

    #[tokio::test]
    async fn full_store_sweeps_expired_records_first() {
        let store = MemoryStore::new(2);
        store.check("a", &POLICY, 0).await;
        store.check("b", &POLICY, 1_500).await;

        store.check("c", &POLICY, 1_600).await;
        assert_eq!(store.len().await, 2);
        // "b" is still live so its quota survives.
        store.check("b", &POLICY, 1_700).await;
        assert!(!store.check("b", &POLICY, 1_800).await.success);
    }

    #[tokio::test]
    async fn full_store_evicts_least_recently_touched() {
        let store = MemoryStore::new(2);
        store.check("a", &POLICY, 0).await;
        store.check("b", &POLICY, 10).await;
        store.check("a", &POLICY, 20).await;

        store.check("c", &POLICY, 30).await;
        assert_eq!(store.len().await, 2);

        // "a" survived with both requests counted; "b" was evicted.
        assert!(!store.check("a", &POLICY, 40).await.success);
        assert_eq!(store.check("b", &POLICY, 50).await.remaining, 1);
    }

    #[tokio::test]
    async fn cleanup_removes_idle_records() {
        let store = MemoryStore::default();
        store.check("a", &POLICY, 0).await;
        store.check("b", &POLICY, 900).await;
        assert_eq!(store.cleanup(1_200).await, 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.cleanup(5_000).await, 1);
        assert!(store.is_empty().await);
    }
}
