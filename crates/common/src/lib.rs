//! common - 通用工具库

pub mod retry;
pub mod singleflight;

pub use retry::*;
pub use singleflight::*;
