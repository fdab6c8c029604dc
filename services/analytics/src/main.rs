//! Creator Analytics Service

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use creator_analytics::api::{AppState, router};
use creator_analytics::application::{Aggregator, AggregatorOptions, AnalyticsService};
use creator_analytics::infrastructure::{SnapshotCache, platforms::build_sources};
use creator_bootstrap::{Infrastructure, init_runtime, shutdown_signal};
use creator_config::AppConfig;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 加载配置
    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_dir)?;

    // 初始化运行时
    let metrics = init_runtime(&config);

    info!("Starting Creator Analytics Service");

    // 缓存后端
    let infra = Infrastructure::from_config(&config.cache).await;

    // 组装服务
    let sources = build_sources(&config)?;
    let aggregator = Arc::new(Aggregator::new(
        sources,
        AggregatorOptions::from(&config.aggregation),
    ));
    let service = Arc::new(AnalyticsService::new(
        aggregator,
        SnapshotCache::new(infra.cache()),
        &config.cache,
    ));

    let app = router(AppState::new(service, metrics));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    info!(%addr, cache = %infra.cache_backend(), "HTTP server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
