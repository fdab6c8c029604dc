//! 集成测试共用的 fetcher 和装配函数

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use creator_adapter_memory::MemoryCache;
use creator_analytics::application::{
    Aggregator, AggregatorOptions, AnalyticsService, PlatformSource,
};
use creator_analytics::domain::{
    FetchError, FetchOutcome, PlatformFetcher, PlatformProfile, RawPlatformResult,
};
use creator_analytics::infrastructure::SnapshotCache;
use creator_config::CacheConfig;
use creator_ports::CachePort;

/// 延迟后返回固定结果，并记录调用次数
pub struct StubFetcher {
    outcome: FetchOutcome,
    delay: Duration,
    revenue_step: u64,
    calls: Arc<AtomicUsize>,
}

impl StubFetcher {
    pub fn ok(revenue: u64, subscribers: u64) -> Self {
        Self::with_outcome(Ok(RawPlatformResult {
            revenue,
            subscribers,
            ..Default::default()
        }))
    }

    pub fn err(error: FetchError) -> Self {
        Self::with_outcome(Err(error))
    }

    pub fn with_outcome(outcome: FetchOutcome) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            revenue_step: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 永不返回（直到被超时取消）
    pub fn hanging() -> Self {
        Self::ok(0, 0).delayed(Duration::from_secs(3600))
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 每次调用后收入增加 `step`，用来区分新旧结果
    pub fn growing(mut self, step: u64) -> Self {
        self.revenue_step = step;
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl PlatformFetcher for StubFetcher {
    async fn fetch(&self) -> FetchOutcome {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone().map(|mut result| {
            result.revenue += self.revenue_step * previous;
            result
        })
    }
}

pub fn source(id: &str, fetcher: StubFetcher) -> PlatformSource {
    let profile = PlatformProfile::builtin(id).unwrap_or_else(|| {
        PlatformProfile::new(id, id.to_uppercase(), "#000000", "?")
    });
    PlatformSource::new(profile, Arc::new(fetcher))
}

pub fn options() -> AggregatorOptions {
    AggregatorOptions {
        fetch_timeout: Duration::from_secs(5),
        cycle_timeout: Duration::from_secs(10),
        time_series_days: 30,
    }
}

pub fn aggregator(sources: Vec<PlatformSource>) -> Arc<Aggregator> {
    Arc::new(Aggregator::new(sources, options()))
}

pub fn service_with_cache(
    sources: Vec<PlatformSource>,
    cache: Arc<dyn CachePort>,
) -> AnalyticsService {
    AnalyticsService::new(
        aggregator(sources),
        SnapshotCache::new(cache),
        &CacheConfig::default(),
    )
}

pub fn service(sources: Vec<PlatformSource>) -> (AnalyticsService, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::new());
    let service = service_with_cache(sources, cache.clone());
    (service, cache)
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
