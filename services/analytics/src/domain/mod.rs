//! 领域模型
//!
//! - `metrics`: 对外数据契约（AnalyticsData 及其组成部分）
//! - `platform`: 平台展示元数据
//! - `fetcher`: 平台抓取接口与原始结果

mod fetcher;
mod metrics;
mod platform;

pub use fetcher::*;
pub use metrics::*;
pub use platform::*;
