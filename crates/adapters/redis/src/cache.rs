//! Redis Cache 实现

use async_trait::async_trait;
use creator_errors::{AppError, AppResult};
use creator_ports::CachePort;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Redis Cache
///
/// 键统一加上 `prefix`，多个部署可以共享同一个 Redis 实例。
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.prefix, key)
        }
    }
}

/// SET EX 的精度是秒，不足一秒按一秒处理
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CachePort for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(self.namespaced(key))
            .await
            .map_err(|e| AppError::cache(format!("Redis get failed: {}", e)))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let key = self.namespaced(key);
        match ttl {
            Some(duration) => conn
                .set_ex(key, value, ttl_secs(duration))
                .await
                .map_err(|e| AppError::cache(format!("Redis set failed: {}", e))),
            None => conn
                .set(key, value)
                .await
                .map_err(|e| AppError::cache(format!("Redis set failed: {}", e))),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.del(self.namespaced(key))
            .await
            .map_err(|e| AppError::cache(format!("Redis delete failed: {}", e)))
    }
}
