//! 应用层
//!
//! 归一化、时间序列、聚合编排以及带缓存的读取入口

pub mod aggregator;
pub mod normalizer;
pub mod service;
pub mod time_series;

pub use aggregator::*;
pub use normalizer::*;
pub use service::*;
pub use time_series::*;
