//! 进程内 TTL 缓存
//!
//! 过期判断基于 `tokio::time::Instant`，测试中可以用暂停的时钟推进时间。

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use creator_errors::{AppError, AppResult};
use creator_ports::CachePort;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::trace;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// 内存缓存
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前条目数量（包含尚未清理的过期条目）
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CachePort for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // 惰性删除过期条目
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            trace!(key, "Evicted expired cache entry");
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        let expires_at = match ttl {
            Some(ttl) => Some(
                Instant::now()
                    .checked_add(ttl)
                    .ok_or_else(|| AppError::cache(format!("ttl out of range: {:?}", ttl)))?,
            ),
            None => None,
        };
        let entry = Entry {
            value: value.to_string(),
            expires_at,
        };
        self.entries.write().insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("analytics", "payload", Some(Duration::from_secs(300)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("analytics").await.unwrap(), Some("payload".to_string()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("analytics").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_replaces_value_and_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", "old", Some(Duration::from_secs(10))).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("k", "new", Some(Duration::from_secs(10))).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get("k").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.set("k", "v", None).await.unwrap();
        tokio::time::advance(Duration::from_secs(86_400 * 365)).await;
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_is_cache_error() {
        let cache = MemoryCache::new();
        cache.set("k", "old", None).await.unwrap();

        let err = cache.set("k", "new", Some(Duration::MAX)).await.unwrap_err();
        assert!(matches!(err, AppError::Cache(_)));
        assert_eq!(cache.get("k").await.unwrap(), Some("old".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();
        cache.set("k", "v", None).await.unwrap();
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
