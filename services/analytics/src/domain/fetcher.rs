//! 平台抓取接口

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 单日样本，用于构建时间序列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySample {
    pub date: NaiveDate,
    pub revenue: u64,
    pub subscribers: u64,
    pub views: u64,
}

/// 平台原始抓取结果
///
/// 金额以最小货币单位（分）表示。没有播放量概念的平台 `views` 为 `None`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlatformResult {
    pub revenue: u64,
    pub subscribers: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    /// 互动率百分比，允许小数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<DailySample>,
}

/// 抓取失败的原因
///
/// 这些都是预期内的情况，由聚合器转换为零值记录，不会导致整个请求失败。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("credentials not configured")]
    NotConfigured,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("unexpected upstream payload: {0}")]
    Decode(String),

    #[error("timed out")]
    Timeout,

    #[error("abandoned at cycle deadline")]
    Abandoned,

    #[error("fetcher panicked: {0}")]
    Panicked(String),
}

impl FetchError {
    /// 日志和 metrics 使用的短标签
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Auth(_) => "auth",
            Self::RateLimited { .. } => "rate_limited",
            Self::Network(_) => "network",
            Self::Upstream { .. } => "upstream",
            Self::Decode(_) => "decode",
            Self::Timeout => "timeout",
            Self::Abandoned => "abandoned",
            Self::Panicked(_) => "panicked",
        }
    }

    /// 是否值得在同一周期内重试
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited { .. } => true,
            Self::Upstream { status } => *status >= 500,
            _ => false,
        }
    }
}

/// 抓取结果（成功或失败）
pub type FetchOutcome = Result<RawPlatformResult, FetchError>;

/// 平台抓取接口
///
/// 凭据在构造时注入。实现不得修改自身以外的共享状态，预期内的失败通过 `FetchError` 返回。
#[async_trait]
pub trait PlatformFetcher: Send + Sync {
    async fn fetch(&self) -> FetchOutcome;
}
