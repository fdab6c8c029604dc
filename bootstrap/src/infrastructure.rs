//! 基础设施资源
//!
//! 根据配置选择缓存后端：配置了 Redis 且可连通时使用 Redis，否则退回进程内缓存。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use creator_adapter_memory::MemoryCache;
use creator_adapter_redis::{RedisCache, check_connection, create_connection_manager};
use creator_common::{RetryConfig, with_retry};
use creator_config::CacheConfig;
use creator_errors::AppResult;
use creator_ports::CachePort;
use secrecy::ExposeSecret;
use tracing::{info, warn};

/// 实际使用的缓存后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Redis => write!(f, "redis"),
        }
    }
}

/// 基础设施资源容器
pub struct Infrastructure {
    cache: Arc<dyn CachePort>,
    cache_backend: CacheBackend,
}

impl Infrastructure {
    /// 从配置创建基础设施资源
    ///
    /// Redis 不可用不会阻止启动，缓存只影响上游调用量。
    pub async fn from_config(config: &CacheConfig) -> Self {
        let Some(url) = config.redis_url.as_ref() else {
            info!(backend = %CacheBackend::Memory, "Cache initialized");
            return Self::in_memory();
        };

        match connect_redis(url.expose_secret(), config).await {
            Ok(cache) => {
                info!(backend = %CacheBackend::Redis, "Cache initialized");
                Self {
                    cache: Arc::new(cache),
                    cache_backend: CacheBackend::Redis,
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Redis unavailable, falling back to in-memory cache"
                );
                Self::in_memory()
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            cache: Arc::new(MemoryCache::new()),
            cache_backend: CacheBackend::Memory,
        }
    }

    pub fn cache(&self) -> Arc<dyn CachePort> {
        Arc::clone(&self.cache)
    }

    pub fn cache_backend(&self) -> CacheBackend {
        self.cache_backend
    }
}

async fn connect_redis(url: &str, config: &CacheConfig) -> AppResult<RedisCache> {
    let retry = RetryConfig::new(3, Duration::from_millis(200), Duration::from_secs(1));
    let timeout = config.redis_connect_timeout();

    let mut conn = with_retry(&retry, "Redis connection", || {
        create_connection_manager(url, timeout)
    })
    .await?;
    check_connection(&mut conn).await?;

    Ok(RedisCache::new(conn, config.redis_prefix.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_to_memory_without_redis_url() {
        let infra = Infrastructure::from_config(&CacheConfig::default()).await;
        assert_eq!(infra.cache_backend(), CacheBackend::Memory);

        let cache = infra.cache();
        cache.set("k", "v", None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_redis_url_falls_back_to_memory() {
        let config = CacheConfig {
            redis_url: Some(secrecy::Secret::new("not-a-redis-url".to_string())),
            ..CacheConfig::default()
        };
        let infra = Infrastructure::from_config(&config).await;
        assert_eq!(infra.cache_backend(), CacheBackend::Memory);
    }
}
