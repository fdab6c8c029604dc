//! 归一化
//!
//! 纯函数：把一个平台的抓取结果与其展示元数据合并为 `PlatformMetrics`。

use creator_errors::AppError;
use thiserror::Error;

use crate::domain::{FetchOutcome, PlatformMetrics, PlatformProfile};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("{platform}: engagement {value} is outside 0..=100")]
    EngagementOutOfRange { platform: String, value: f64 },
}

impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        AppError::internal(err.to_string())
    }
}

/// 归一化单个平台
///
/// 失败的抓取得到零值记录；成功但无法解释的数据返回 `NormalizeError`。
pub fn normalize(
    profile: &PlatformProfile,
    outcome: &FetchOutcome,
) -> Result<PlatformMetrics, NormalizeError> {
    let (revenue, subscribers, views, engagement) = match outcome {
        Ok(raw) => (
            raw.revenue,
            raw.subscribers,
            raw.views.unwrap_or(0),
            engagement_percent(profile, raw.engagement)?,
        ),
        Err(_) => (0, 0, 0, 0),
    };

    Ok(PlatformMetrics {
        name: profile.name.clone(),
        revenue,
        subscribers,
        views,
        engagement,
        color: profile.color.clone(),
        icon: profile.icon.clone(),
    })
}

fn engagement_percent(
    profile: &PlatformProfile,
    engagement: Option<f64>,
) -> Result<u8, NormalizeError> {
    let Some(value) = engagement else {
        return Ok(0);
    };

    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(NormalizeError::EngagementOutOfRange {
            platform: profile.id.clone(),
            value,
        });
    }
    Ok(value.round() as u8)
}
