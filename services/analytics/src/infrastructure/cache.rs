//! 类型化的快照缓存
//!
//! 在 `CachePort` 之上做 JSON 编解码。无法解码的条目按缓存错误处理。

use std::sync::Arc;
use std::time::Duration;

use creator_errors::{AppError, AppResult};
use creator_ports::CachePort;

use crate::domain::AnalyticsData;

#[derive(Clone)]
pub struct SnapshotCache {
    port: Arc<dyn CachePort>,
}

impl SnapshotCache {
    pub fn new(port: Arc<dyn CachePort>) -> Self {
        Self { port }
    }

    pub async fn get(&self, key: &str) -> AppResult<Option<AnalyticsData>> {
        let Some(raw) = self.port.get(key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::cache(format!("undecodable entry for {}: {}", key, e)))
    }

    pub async fn put(&self, key: &str, data: &AnalyticsData, ttl: Duration) -> AppResult<()> {
        let raw = serde_json::to_string(data)?;
        self.port.set(key, &raw, Some(ttl)).await
    }
}
