//! 对外数据契约
//!
//! `AnalyticsData` 的合计字段不单独存储：每次读取和序列化时都从 `platforms` 重新计算，
//! 反序列化（例如读取缓存）时丢弃传入的合计值。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个平台的指标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformMetrics {
    pub name: String,
    /// 最小货币单位（分）
    pub revenue: u64,
    pub subscribers: u64,
    /// 0 表示该平台没有播放量概念或本周期无数据
    pub views: u64,
    /// 0..=100
    pub engagement: u8,
    pub color: String,
    pub icon: String,
}

/// 单日汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// `MMM dd`，例如 `Oct 05`
    pub date: String,
    pub revenue: u64,
    pub subscribers: u64,
    pub views: u64,
}

/// 一次聚合的完整结果，创建后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "AnalyticsPayload", from = "AnalyticsPayload")]
pub struct AnalyticsData {
    platforms: Vec<PlatformMetrics>,
    time_series: Vec<TimeSeriesPoint>,
    last_updated: DateTime<Utc>,
}

impl AnalyticsData {
    pub fn new(
        platforms: Vec<PlatformMetrics>,
        time_series: Vec<TimeSeriesPoint>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            platforms,
            time_series,
            last_updated,
        }
    }

    pub fn total_revenue(&self) -> u64 {
        sum(&self.platforms, |p| p.revenue)
    }

    pub fn total_subscribers(&self) -> u64 {
        sum(&self.platforms, |p| p.subscribers)
    }

    pub fn total_views(&self) -> u64 {
        sum(&self.platforms, |p| p.views)
    }

    pub fn platforms(&self) -> &[PlatformMetrics] {
        &self.platforms
    }

    pub fn time_series(&self) -> &[TimeSeriesPoint] {
        &self.time_series
    }

    /// 聚合发生的时间（而不是从缓存返回的时间）
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

fn sum(platforms: &[PlatformMetrics], field: impl Fn(&PlatformMetrics) -> u64) -> u64 {
    platforms.iter().map(field).fold(0, u64::saturating_add)
}

/// JSON 线格式
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsPayload {
    #[serde(default)]
    total_revenue: u64,
    #[serde(default)]
    total_subscribers: u64,
    #[serde(default)]
    total_views: u64,
    platforms: Vec<PlatformMetrics>,
    time_series: Vec<TimeSeriesPoint>,
    last_updated: DateTime<Utc>,
}

impl From<AnalyticsData> for AnalyticsPayload {
    fn from(data: AnalyticsData) -> Self {
        Self {
            total_revenue: data.total_revenue(),
            total_subscribers: data.total_subscribers(),
            total_views: data.total_views(),
            platforms: data.platforms,
            time_series: data.time_series,
            last_updated: data.last_updated,
        }
    }
}

impl From<AnalyticsPayload> for AnalyticsData {
    fn from(payload: AnalyticsPayload) -> Self {
        Self::new(payload.platforms, payload.time_series, payload.last_updated)
    }
}
