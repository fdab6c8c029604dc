//! 请求处理

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::AppState;
use super::error::ApiError;
use crate::domain::{AnalyticsData, RawPlatformResult};

/// GET /api/analytics
pub async fn analytics(State(state): State<AppState>) -> Result<Json<AnalyticsData>, ApiError> {
    state
        .service
        .analytics()
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, "Failed to fetch analytics"))
}

/// GET /api/platforms/{id}
pub async fn platform(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RawPlatformResult>, ApiError> {
    state
        .service
        .platform(&id)
        .await
        .map(Json)
        .map_err(|e| ApiError::new(e, format!("Failed to fetch {} data", id)))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => not_found().await.into_response(),
    }
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
