//! 上游 HTTP 调用的公共部分
//!
//! 状态码与传输错误统一映射为 `FetchError`，瞬时错误按配置重试。

use std::time::Duration;

use creator_common::{RetryConfig, with_conditional_retry};
use creator_errors::{AppError, AppResult};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::domain::FetchError;

const USER_AGENT: &str = concat!("creator-analytics/", env!("CARGO_PKG_VERSION"));

/// 单个平台使用的 HTTP 客户端
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    retry: RetryConfig,
}

impl UpstreamClient {
    /// `attempts` 包含第一次请求
    pub fn new(timeout: Duration, attempts: u32) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            retry: RetryConfig::new(attempts, Duration::from_millis(200), Duration::from_secs(2)),
        })
    }

    /// 发送请求并解码 JSON 响应体
    ///
    /// `build` 每次尝试都会重新调用。
    pub async fn send_json<T, B>(&self, operation: &str, build: B) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        B: Fn(&Client) -> RequestBuilder,
    {
        let http = &self.http;
        let build = &build;

        with_conditional_retry(
            &self.retry,
            operation,
            move || {
                let request = build(http);
                async move {
                    let response = request.send().await.map_err(transport_error)?;
                    decode(response).await
                }
            },
            FetchError::is_transient,
        )
        .await
    }
}

/// 检查状态码并解码 JSON
pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status, response.headers()));
    }

    let body = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
}

/// 非 2xx 状态码映射
pub fn status_error(status: StatusCode, headers: &HeaderMap) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FetchError::Auth(format!("HTTP {}", status.as_u16()))
        }
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited {
            retry_after_secs: headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok()),
        },
        _ => FetchError::Upstream {
            status: status.as_u16(),
        },
    }
}

/// reqwest 错误映射
pub fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_decode() {
        FetchError::Decode(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}

/// 拼接 API 路径，容忍 base URL 末尾的 `/`
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
