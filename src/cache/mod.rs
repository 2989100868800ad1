mod memory;
mod models;
mod redis;

pub use self::memory::MemoryRateLimitStore;
pub use self::models::RateLimitRecord;
pub use self::redis::RedisRateLimitStore;

use async_trait::async_trait;

/// 按标识存取速率限制记录的后端
///
/// 读写失败按未命中处理，限流是尽力而为的。
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<RateLimitRecord>;
    async fn set(&self, key: &str, record: RateLimitRecord);
}
