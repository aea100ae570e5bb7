use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{RateLimitError, RateLimitPolicy, RateLimitResult, RateLimitStore};

/// Trim, count, and conditionally record in one round trip.
/// Returns `{allowed, count, reset_ms}`.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)

if count < limit then
    redis.call('ZADD', key, now, ARGV[4])
    redis.call('PEXPIRE', key, window)
    return {1, count + 1, now + window}
end

local reset = now + window
local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
if oldest[2] then
    reset = tonumber(oldest[2]) + window
end
return {0, count, reset}
"#;

/// Sliding-window store shared by every process pointed at the same Redis.
pub struct RedisStore {
    conn: ConnectionManager,
    script: redis::Script,
    timeout: Duration,
}

impl RedisStore {
    /// Connect to `url`, using `token` as the password when given.
    pub async fn connect(
        url: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, RateLimitError> {
        let url = connection_url(url, token)?;
        let client =
            redis::Client::open(url.as_str()).map_err(|e| RateLimitError::Connect(e.to_string()))?;

        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| RateLimitError::Timeout(timeout))?
            .map_err(|e| RateLimitError::Connect(e.to_string()))?;

        debug!(host = ?url.host_str(), "Connected to Redis rate limit store");
        Ok(Self {
            conn,
            script: redis::Script::new(SLIDING_WINDOW_SCRIPT),
            timeout,
        })
    }
}

fn connection_url(raw: &str, token: Option<&str>) -> Result<Url, RateLimitError> {
    let mut url = Url::parse(raw).map_err(|e| RateLimitError::Connect(format!("invalid URL: {e}")))?;
    if let Some(token) = token {
        if url.username().is_empty() {
            url.set_username("default")
                .map_err(|_| RateLimitError::Connect("URL cannot carry credentials".into()))?;
        }
        url.set_password(Some(token))
            .map_err(|_| RateLimitError::Connect("URL cannot carry credentials".into()))?;
    }
    Ok(url)
}

fn to_result(policy: &RateLimitPolicy, reply: (i64, i64, i64)) -> RateLimitResult {
    let (allowed, count, reset) = reply;
    let count = u32::try_from(count.max(0)).unwrap_or(u32::MAX);
    RateLimitResult {
        success: allowed == 1,
        limit: policy.max_requests,
        remaining: policy.max_requests.saturating_sub(count),
        reset,
    }
}

#[async_trait]
impl RateLimitStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn hit(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now_ms: i64,
    ) -> Result<RateLimitResult, RateLimitError> {
        let mut conn = self.conn.clone();
        let member = format!("{}-{}", now_ms, Uuid::new_v4());

        let mut invocation = self.script.key(key);
        invocation
            .arg(now_ms)
            .arg(policy.window_ms)
            .arg(policy.max_requests)
            .arg(member);

        let reply: (i64, i64, i64) =
            tokio::time::timeout(self.timeout, invocation.invoke_async(&mut conn))
                .await
                .map_err(|_| RateLimitError::Timeout(self.timeout))?
                .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        Ok(to_result(policy, reply))
    }
}
