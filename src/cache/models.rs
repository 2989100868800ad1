use serde::{Deserialize, Serialize};

/// 速率限制记录
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RateLimitRecord {
    pub key: String,
    pub count: u32,
    pub reset_at: i64, // Unix timestamp
}
