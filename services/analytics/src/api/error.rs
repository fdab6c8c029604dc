//! HTTP 错误响应
//!
//! 对外只返回通用消息，具体原因记录在日志中。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use creator_errors::{AppError, ErrorBody};
use tracing::{debug, error};

/// 带公开消息的应用错误
#[derive(Debug)]
pub struct ApiError {
    source: AppError,
    message: String,
}

impl ApiError {
    pub fn new(source: AppError, message: impl Into<String>) -> Self {
        Self {
            source,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.source.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.source.is_server_error() {
            error!(status = status.as_u16(), error = %self.source, "Request failed");
        } else {
            debug!(status = status.as_u16(), error = %self.source, "Request rejected");
        }

        match self.source {
            AppError::NotFound(_) => (status, "Not Found").into_response(),
            _ => (status, Json(ErrorBody::new(self.message))).into_response(),
        }
    }
}
