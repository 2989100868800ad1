use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use super::{RateLimitRecord, RateLimitStore};

/// Redis后端的速率限制表，记录以JSON存储并带TTL
pub struct RedisRateLimitStore {
    redis: Arc<RedisClient>,
}

impl RedisRateLimitStore {
    pub fn new(redis: RedisClient) -> Self {
        Self {
            redis: Arc::new(redis),
        }
    }

    async fn read(&self, redis_key: &str) -> Result<Option<RateLimitRecord>, redis::RedisError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let result: Option<String> = conn.get(redis_key).await?;

        match result {
            Some(json) => {
                let record = serde_json::from_str(&json).map_err(|e| {
                    redis::RedisError::from((redis::ErrorKind::IoError, "反序列化错误", e.to_string()))
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        redis_key: &str,
        record: &RateLimitRecord,
    ) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let json = serde_json::to_string(record).map_err(|e| {
            redis::RedisError::from((redis::ErrorKind::IoError, "序列化错误", e.to_string()))
        })?;

        // TTL到窗口重置为止，窗口结束后记录自动消失
        let ttl = (record.reset_at - chrono::Utc::now().timestamp()).max(1) as u64;
        let _: () = conn.set_ex(redis_key, json, ttl).await?;

        Ok(())
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn get(&self, key: &str) -> Option<RateLimitRecord> {
        let redis_key = format!("rate_limit:{}", key);
        match self.read(&redis_key).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Failed to read rate limit record for {}: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, record: RateLimitRecord) {
        let redis_key = format!("rate_limit:{}", key);
        if let Err(e) = self.write(&redis_key, &record).await {
            tracing::warn!("Failed to store rate limit record for {}: {}", key, e);
        }
    }
}
