//! 基础设施层
//!
//! - `cache`: AnalyticsData 的缓存编解码
//! - `platforms`: 各平台的抓取实现

mod cache;
pub mod platforms;

pub use cache::*;
