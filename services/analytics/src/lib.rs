//! Creator Analytics
//!
//! 聚合多个创作者平台（YouTube、Patreon、Twitch、Whop）的收入、订阅和播放数据，
//! 带短期缓存，通过 HTTP 提供给仪表盘。

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
