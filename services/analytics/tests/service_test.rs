//! 缓存读取路径测试
//!
//! 覆盖：
//! - 命中、未命中与 TTL 过期
//! - 缓存读写失败时的降级
//! - 并发未命中的合并
//! - 单平台直连

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use creator_analytics::application::AnalyticsService;
use creator_analytics::domain::{FetchError, RawPlatformResult};
use creator_errors::AppError;
use creator_ports::{CachePort, MockCachePort};

#[tokio::test(start_paused = true)]
async fn test_cache_hit_skips_aggregation() {
    let fetcher = StubFetcher::ok(100, 10);
    let counter = fetcher.calls();
    let (service, cache) = service(vec![source("youtube", fetcher)]);

    let first = service.analytics().await.unwrap();
    assert_eq!(calls(&counter), 1);
    assert!(cache.get("analytics").await.unwrap().is_some());

    tokio::time::advance(Duration::from_secs(60)).await;
    let second = service.analytics().await.unwrap();

    assert_eq!(calls(&counter), 1);
    assert_eq!(second, first);
    assert_eq!(second.last_updated(), first.last_updated());
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_triggers_new_cycle() {
    let fetcher = StubFetcher::ok(100, 10).growing(5);
    let counter = fetcher.calls();
    let (service, _cache) = service(vec![source("youtube", fetcher)]);

    let first = service.analytics().await.unwrap();
    tokio::time::advance(Duration::from_secs(299)).await;
    let cached = service.analytics().await.unwrap();
    assert_eq!(cached, first);

    tokio::time::advance(Duration::from_secs(2)).await;
    let second = service.analytics().await.unwrap();

    assert_eq!(calls(&counter), 2);
    assert_eq!(first.total_revenue(), 100);
    assert_eq!(second.total_revenue(), 105);
    assert_ne!(second, first);
    assert!(second.last_updated() >= first.last_updated());
}

#[tokio::test(start_paused = true)]
async fn test_cache_read_failure_degrades_to_aggregation() {
    let mut port = MockCachePort::new();
    port.expect_get()
        .returning(|_| Err(AppError::cache("connection refused")));
    port.expect_set().returning(|_, _, _| Ok(()));

    let fetcher = StubFetcher::ok(100, 10);
    let counter = fetcher.calls();
    let service = service_with_cache(vec![source("youtube", fetcher)], Arc::new(port));

    let data = service.analytics().await.unwrap();
    assert_eq!(data.total_revenue(), 100);

    service.analytics().await.unwrap();
    assert_eq!(calls(&counter), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cache_write_failure_still_returns_data() {
    let mut port = MockCachePort::new();
    port.expect_get().returning(|_| Ok(None));
    port.expect_set()
        .times(1)
        .returning(|_, _, _| Err(AppError::cache("read-only replica")));

    let service = service_with_cache(
        vec![source("patreon", StubFetcher::ok(425_000, 127))],
        Arc::new(port),
    );

    let data = service.analytics().await.unwrap();
    assert_eq!(data.total_revenue(), 425_000);
}

#[tokio::test(start_paused = true)]
async fn test_undecodable_entry_is_replaced() {
    let (service, cache) = service(vec![source("youtube", StubFetcher::ok(100, 10))]);
    cache.set("analytics", "{\"totalRevenue\":", None).await.unwrap();

    let data = service.analytics().await.unwrap();
    assert_eq!(data.total_revenue(), 100);

    let stored = cache.get("analytics").await.unwrap().unwrap();
    assert!(stored.contains("\"totalRevenue\":100"));
}

#[tokio::test(start_paused = true)]
async fn test_aggregation_failure_is_not_cached() {
    let fetcher = StubFetcher::with_outcome(Ok(RawPlatformResult {
        engagement: Some(140.0),
        ..Default::default()
    }));
    let (service, cache) = service(vec![source("twitch", fetcher)]);

    let err = service.analytics().await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_misses_share_one_cycle() {
    let fetcher = StubFetcher::ok(100, 10).delayed(Duration::from_millis(500));
    let counter = fetcher.calls();
    let (service, _cache) = service(vec![source("youtube", fetcher)]);
    let service: Arc<AnalyticsService> = Arc::new(service);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move { service.analytics().await }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(calls(&counter), 1);
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_platform_route_bypasses_cache() {
    let fetcher = StubFetcher::ok(100, 10);
    let counter = fetcher.calls();
    let (service, cache) = service(vec![
        source("youtube", fetcher),
        source("whop", StubFetcher::err(FetchError::RateLimited { retry_after_secs: Some(5) })),
    ]);

    let raw = service.platform("youtube").await.unwrap();
    assert_eq!(raw.revenue, 100);
    service.platform("youtube").await.unwrap();
    assert_eq!(calls(&counter), 2);
    assert!(cache.is_empty());

    assert!(matches!(
        service.platform("whop").await,
        Err(AppError::ExternalService(_))
    ));
    assert!(matches!(
        service.platform("myspace").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        service.platform("twitch").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_platform_route_is_bounded_by_fetch_timeout() {
    let (service, _cache) = service(vec![source("patreon", StubFetcher::hanging())]);

    let err = service.platform("patreon").await.unwrap_err();
    assert!(matches!(err, AppError::ExternalService(ref msg) if msg.contains("timed out")));
}
