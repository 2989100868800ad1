use std::sync::Arc;

use chrono::Utc;

use crate::{
    cache::{RateLimitRecord, RateLimitStore},
    config::Config,
};

/// 一次检查的结果，remaining是本次请求计入后的剩余额度
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: i64,
}

/// 按标识滑动窗口限流
///
/// check只读，increment仅在生成成功后由处理器调用，
/// 两者之间没有原子性，同一标识的并发请求可能超出限额。
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    limit: u32,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, config: &Config) -> Self {
        Self {
            store,
            limit: config.rate_limit_requests,
            window_secs: config.rate_limit_window_secs,
        }
    }

    /// 只读检查，不改变存储状态
    pub async fn check(&self, identity: &str) -> RateLimitStatus {
        let now = Utc::now().timestamp();

        match self.store.get(identity).await {
            Some(record) if now <= record.reset_at => RateLimitStatus {
                allowed: record.count < self.limit,
                remaining: self.limit.saturating_sub(record.count).saturating_sub(1),
                reset_at: record.reset_at,
            },
            // 无记录或已过窗口:reset时间是假设值，尚未写入存储
            _ => RateLimitStatus {
                allowed: true,
                remaining: self.limit.saturating_sub(1),
                reset_at: now + self.window_secs as i64,
            },
        }
    }

    /// 计入一次成功的生成
    pub async fn increment(&self, identity: &str) {
        let now = Utc::now().timestamp();

        let record = match self.store.get(identity).await {
            Some(mut record) if now <= record.reset_at => {
                record.count += 1;
                record
            }
            _ => RateLimitRecord {
                key: identity.to_string(),
                count: 1,
                reset_at: now + self.window_secs as i64,
            },
        };

        self.store.set(identity, record).await;
    }
}
