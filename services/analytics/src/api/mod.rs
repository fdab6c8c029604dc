//! HTTP 接口
//!
//! | 方法 | 路径 | 说明 |
//! |------|------|------|
//! | GET, POST | /api/analytics | 聚合数据（带缓存） |
//! | GET, POST | /api/platforms/{id} | 单个平台的原始数据 |
//! | GET | /health | 健康检查 |
//! | GET | /metrics | Prometheus 指标 |
//! | OPTIONS | 任意 | CORS 预检 |

mod cors;
mod error;
mod handlers;

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

pub use cors::cors_middleware;
pub use error::ApiError;
pub use handlers::HealthResponse;

use crate::application::AnalyticsService;

/// 请求处理共享的状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalyticsService>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(service: Arc<AnalyticsService>, metrics: Option<PrometheusHandle>) -> Self {
        Self { service, metrics }
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/analytics",
            get(handlers::analytics).post(handlers::analytics),
        )
        .route(
            "/api/platforms/{id}",
            get(handlers::platform).post(handlers::platform),
        )
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(cors_middleware))
}
