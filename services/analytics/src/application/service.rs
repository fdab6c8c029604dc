//! 带缓存的读取入口
//!
//! 命中直接返回缓存中的快照（保留原始 `lastUpdated`）；未命中时聚合并写回。
//! 缓存的任何失败都只记录日志和计数，请求退回到直接聚合。

use std::sync::Arc;
use std::time::Duration;

use creator_common::SingleFlight;
use creator_config::CacheConfig;
use creator_errors::{AppError, AppResult};
use metrics::counter;
use tracing::{debug, warn};

use super::aggregator::Aggregator;
use crate::domain::{AnalyticsData, RawPlatformResult};
use crate::infrastructure::SnapshotCache;

/// 分析服务
pub struct AnalyticsService {
    aggregator: Arc<Aggregator>,
    cache: SnapshotCache,
    key: String,
    ttl: Duration,
    flight: Option<SingleFlight<AnalyticsData>>,
}

impl AnalyticsService {
    pub fn new(aggregator: Arc<Aggregator>, cache: SnapshotCache, config: &CacheConfig) -> Self {
        Self {
            aggregator,
            cache,
            key: config.key.clone(),
            ttl: config.ttl(),
            flight: config.single_flight.then(SingleFlight::new),
        }
    }

    /// 获取聚合数据，优先读缓存
    pub async fn analytics(&self) -> AppResult<AnalyticsData> {
        match self.cache.get(&self.key).await {
            Ok(Some(data)) => {
                counter!("analytics_cache_hits_total").increment(1);
                debug!(key = %self.key, "Cache hit");
                return Ok(data);
            }
            Ok(None) => {
                counter!("analytics_cache_misses_total").increment(1);
                debug!(key = %self.key, "Cache miss");
            }
            Err(e) => {
                counter!("analytics_cache_errors_total", "op" => "get").increment(1);
                warn!(key = %self.key, error = %e, "Cache read failed, aggregating directly");
            }
        }

        match &self.flight {
            Some(flight) => flight.run(&self.key, || self.refresh()).await,
            None => self.refresh().await,
        }
    }

    /// 忽略缓存执行一次聚合并写回
    pub async fn refresh(&self) -> AppResult<AnalyticsData> {
        let data = self.aggregator.aggregate().await?;

        if let Err(e) = self.cache.put(&self.key, &data, self.ttl).await {
            counter!("analytics_cache_errors_total", "op" => "put").increment(1);
            warn!(key = %self.key, error = %e, "Cache write failed");
        }

        Ok(data)
    }

    /// 直接抓取单个平台的原始数据
    pub async fn platform(&self, id: &str) -> AppResult<RawPlatformResult> {
        let Some(outcome) = self.aggregator.fetch_one(id).await else {
            return Err(AppError::not_found(format!("platform {}", id)));
        };

        outcome.map_err(|e| {
            counter!(
                "platform_fetch_failures_total",
                "platform" => id.to_string(),
                "reason" => e.reason()
            )
            .increment(1);
            AppError::external_service(format!("{}: {}", id, e))
        })
    }
}
