//! Redis 连接管理

use std::time::Duration;

use creator_errors::{AppError, AppResult};
use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

/// 创建 Redis 连接管理器，`connect_timeout` 限制首次连接耗时
pub async fn create_connection_manager(
    url: &str,
    connect_timeout: Duration,
) -> AppResult<ConnectionManager> {
    let client = Client::open(url)
        .map_err(|e| AppError::cache(format!("Failed to create Redis client: {}", e)))?;

    let manager = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
        .await
        .map_err(|_| AppError::cache("Timed out connecting to Redis"))?
        .map_err(|e| {
            AppError::cache(format!("Failed to create Redis connection manager: {}", e))
        })?;

    info!("Redis connection manager created");
    Ok(manager)
}

/// 检查 Redis 连接
pub async fn check_connection(conn: &mut ConnectionManager) -> AppResult<()> {
    redis::cmd("PING")
        .query_async::<String>(conn)
        .await
        .map_err(|e| AppError::cache(format!("Redis health check failed: {}", e)))?;
    Ok(())
}
