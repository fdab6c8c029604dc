//! 聚合器
//!
//! 一个周期内并发抓取所有配置的平台，等待全部结束（或周期截止），按配置顺序归一化，
//! 生成时间序列并盖上时间戳。单个平台的失败只影响该平台的记录。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use creator_config::AggregationConfig;
use creator_errors::AppResult;
use futures::FutureExt;
use metrics::{counter, histogram};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::normalizer::normalize;
use super::time_series::TimeSeriesBuilder;
use crate::domain::{AnalyticsData, FetchError, FetchOutcome, PlatformFetcher, PlatformProfile};

/// 一个参与聚合的平台
#[derive(Clone)]
pub struct PlatformSource {
    pub profile: PlatformProfile,
    pub fetcher: Arc<dyn PlatformFetcher>,
}

impl PlatformSource {
    pub fn new(profile: PlatformProfile, fetcher: Arc<dyn PlatformFetcher>) -> Self {
        Self { profile, fetcher }
    }

    pub fn id(&self) -> &str {
        &self.profile.id
    }
}

/// 聚合周期参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorOptions {
    pub fetch_timeout: Duration,
    pub cycle_timeout: Duration,
    pub time_series_days: u32,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self::from(&AggregationConfig::default())
    }
}

impl From<&AggregationConfig> for AggregatorOptions {
    fn from(config: &AggregationConfig) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout(),
            cycle_timeout: config.cycle_timeout(),
            time_series_days: config.time_series_days,
        }
    }
}

/// 聚合器
pub struct Aggregator {
    sources: Vec<PlatformSource>,
    options: AggregatorOptions,
    series: TimeSeriesBuilder,
}

impl Aggregator {
    pub fn new(sources: Vec<PlatformSource>, options: AggregatorOptions) -> Self {
        Self {
            sources,
            series: TimeSeriesBuilder::new(options.time_series_days),
            options,
        }
    }

    pub fn source(&self, id: &str) -> Option<&PlatformSource> {
        self.sources.iter().find(|s| s.id() == id)
    }

    /// 执行一个完整的聚合周期
    ///
    /// 只有归一化失败会返回错误，平台抓取失败表现为零值记录。
    pub async fn aggregate(&self) -> AppResult<AnalyticsData> {
        let started = Instant::now();
        let outcomes = self.collect().await;
        let now = Utc::now();

        let data = self.assemble(&outcomes, now)?;

        let elapsed = started.elapsed();
        histogram!("analytics_aggregation_duration_seconds").record(elapsed.as_secs_f64());
        info!(
            platforms = outcomes.len(),
            failed = outcomes.iter().filter(|o| o.is_err()).count(),
            total_revenue = data.total_revenue(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Aggregation cycle completed"
        );

        Ok(data)
    }

    /// 并发抓取所有平台，结果按配置顺序排列
    ///
    /// 等待所有任务结束；周期截止时中止剩余任务，对应位置记为 `Abandoned`。
    pub async fn collect(&self) -> Vec<FetchOutcome> {
        let mut slots: Vec<Option<FetchOutcome>> = vec![None; self.sources.len()];
        let mut tasks = JoinSet::new();

        for (index, source) in self.sources.iter().enumerate() {
            let fetcher = Arc::clone(&source.fetcher);
            let timeout = self.options.fetch_timeout;
            tasks.spawn(async move { (index, guarded_fetch(fetcher, timeout).await) });
        }

        let deadline = Instant::now() + self.options.cycle_timeout;
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, outcome)))) => slots[index] = Some(outcome),
                // guarded_fetch 已捕获 panic，这里只可能是被中止
                Ok(Some(Err(e))) => debug!(error = %e, "Fetch task ended abnormally"),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        pending = tasks.len(),
                        cycle_timeout_ms = self.options.cycle_timeout.as_millis() as u64,
                        "Cycle deadline reached, abandoning pending fetches"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Err(FetchError::Abandoned)))
            .collect()
    }

    /// 单独抓取一个平台，不经过缓存和归一化
    pub async fn fetch_one(&self, id: &str) -> Option<FetchOutcome> {
        let source = self.source(id)?;
        Some(guarded_fetch(Arc::clone(&source.fetcher), self.options.fetch_timeout).await)
    }

    fn assemble(&self, outcomes: &[FetchOutcome], now: DateTime<Utc>) -> AppResult<AnalyticsData> {
        let mut platforms = Vec::with_capacity(outcomes.len());
        for (source, outcome) in self.sources.iter().zip(outcomes) {
            if let Err(e) = outcome {
                warn!(
                    platform = %source.profile.id,
                    reason = e.reason(),
                    error = %e,
                    "Platform fetch failed"
                );
                counter!(
                    "platform_fetch_failures_total",
                    "platform" => source.profile.id.clone(),
                    "reason" => e.reason()
                )
                .increment(1);
            }
            platforms.push(normalize(&source.profile, outcome)?);
        }

        let histories = outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok())
            .map(|raw| raw.history.as_slice());
        let time_series = self.series.build(now.date_naive(), histories);

        Ok(AnalyticsData::new(platforms, time_series, now))
    }
}

/// 带超时的抓取，panic 转换为 `FetchError::Panicked`
async fn guarded_fetch(fetcher: Arc<dyn PlatformFetcher>, timeout: Duration) -> FetchOutcome {
    let fetch = AssertUnwindSafe(fetcher.fetch()).catch_unwind();
    match tokio::time::timeout(timeout, fetch).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(payload)) => Err(FetchError::Panicked(panic_message(payload.as_ref()))),
        Err(_) => Err(FetchError::Timeout),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawPlatformResult;
    use async_trait::async_trait;

    struct Fixed(FetchOutcome);

    #[async_trait]
    impl PlatformFetcher for Fixed {
        async fn fetch(&self) -> FetchOutcome {
            self.0.clone()
        }
    }

    struct Panics;

    #[async_trait]
    impl PlatformFetcher for Panics {
        async fn fetch(&self) -> FetchOutcome {
            panic!("token cache poisoned")
        }
    }

    fn source(id: &str, fetcher: impl PlatformFetcher + 'static) -> PlatformSource {
        PlatformSource::new(PlatformProfile::builtin(id).unwrap(), Arc::new(fetcher))
    }

    #[tokio::test]
    async fn test_panicking_fetcher_is_contained() {
        let aggregator = Aggregator::new(
            vec![
                source("youtube", Panics),
                source(
                    "whop",
                    Fixed(Ok(RawPlatformResult {
                        revenue: 10,
                        subscribers: 1,
                        ..Default::default()
                    })),
                ),
            ],
            AggregatorOptions::default(),
        );

        let outcomes = aggregator.collect().await;
        assert_eq!(
            outcomes[0],
            Err(FetchError::Panicked("token cache poisoned".into()))
        );
        assert!(outcomes[1].is_ok());

        let data = aggregator.aggregate().await.unwrap();
        assert_eq!(data.total_revenue(), 10);
        assert_eq!(data.platforms()[0].revenue, 0);
    }

    #[tokio::test]
    async fn test_malformed_engagement_fails_cycle() {
        let aggregator = Aggregator::new(
            vec![source(
                "twitch",
                Fixed(Ok(RawPlatformResult {
                    engagement: Some(250.0),
                    ..Default::default()
                })),
            )],
            AggregatorOptions::default(),
        );

        let err = aggregator.aggregate().await.unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_fetch_one_unknown_platform() {
        let aggregator = Aggregator::new(
            vec![source("patreon", Fixed(Err(FetchError::NotConfigured)))],
            AggregatorOptions::default(),
        );

        assert!(aggregator.fetch_one("myspace").await.is_none());
        assert_eq!(
            aggregator.fetch_one("patreon").await,
            Some(Err(FetchError::NotConfigured))
        );
    }

    #[test]
    fn test_options_from_config() {
        let options = AggregatorOptions::default();
        assert_eq!(options.fetch_timeout, Duration::from_secs(5));
        assert_eq!(options.cycle_timeout, Duration::from_secs(10));
        assert_eq!(options.time_series_days, 30);
    }
}
