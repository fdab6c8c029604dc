//! Cache trait 定义

use async_trait::async_trait;
use creator_errors::AppResult;
use std::time::Duration;

/// 缓存 trait
///
/// 值为序列化后的字符串，类型化由调用方负责。`ttl` 为 `None` 时永不过期。
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait CachePort: Send + Sync {
    /// 获取缓存值，过期或不存在时返回 `None`
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// 设置缓存值，整体替换旧值
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()>;

    /// 删除缓存
    async fn delete(&self, key: &str) -> AppResult<()>;
}
