use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{RateLimitRecord, RateLimitStore};

/// 进程内的速率限制表
///
/// 不做过期清理，过期记录在下次访问时被覆盖。
#[derive(Default)]
pub struct MemoryRateLimitStore {
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn get(&self, key: &str) -> Option<RateLimitRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.get(key).cloned()
    }

    async fn set(&self, key: &str, record: RateLimitRecord) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.insert(key.to_string(), record);
    }
}
