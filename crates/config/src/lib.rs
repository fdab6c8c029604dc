//! creator-config - 配置加载库
//!
//! 加载顺序：`{dir}/default.toml` → `{dir}/{APP_ENV}.toml` → `CREATOR_` 前缀的环境变量
//! （嵌套字段用 `__` 分隔，例如 `CREATOR_CACHE__TTL_SECS=60`）。所有字段都有默认值。

use std::collections::HashSet;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

/// 内置平台标识，顺序即默认聚合顺序
pub const KNOWN_PLATFORMS: &[&str] = &["youtube", "patreon", "twitch", "whop"];

/// 缓存 TTL 上限（1 天）
pub const MAX_CACHE_TTL_SECS: u64 = 86_400;

/// 单次抓取和整个周期的超时上限（10 分钟）
pub const MAX_TIMEOUT_MS: u64 = 600_000;

/// 时间序列回看窗口上限
pub const MAX_TIME_SERIES_DAYS: u32 = 366;

/// 每次抓取的最大尝试次数上限
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_enabled: true,
        }
    }
}

/// 缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_key")]
    pub key: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// 合并并发的缓存未命中
    #[serde(default = "default_true")]
    pub single_flight: bool,
    /// 未配置时使用进程内缓存
    pub redis_url: Option<Secret<String>>,
    #[serde(default = "default_redis_prefix")]
    pub redis_prefix: String,
    #[serde(default = "default_redis_connect_timeout_ms")]
    pub redis_connect_timeout_ms: u64,
}

fn default_cache_key() -> String {
    "analytics".to_string()
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_redis_prefix() -> String {
    "creator".to_string()
}

fn default_redis_connect_timeout_ms() -> u64 {
    2000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: default_cache_key(),
            ttl_secs: default_ttl_secs(),
            single_flight: true,
            redis_url: None,
            redis_prefix: default_redis_prefix(),
            redis_connect_timeout_ms: default_redis_connect_timeout_ms(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn redis_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_connect_timeout_ms)
    }
}

/// 聚合配置
#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    /// 参与聚合的平台及其顺序
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    /// 单个平台抓取的超时
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// 整个聚合周期的超时
    #[serde(default = "default_cycle_timeout_ms")]
    pub cycle_timeout_ms: u64,
    #[serde(default = "default_time_series_days")]
    pub time_series_days: u32,
    /// 瞬时错误的最大尝试次数（包含第一次）
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// 使用演示数据代替真实平台
    #[serde(default)]
    pub demo_mode: bool,
}

fn default_platforms() -> Vec<String> {
    KNOWN_PLATFORMS.iter().map(|p| p.to_string()).collect()
}

fn default_fetch_timeout_ms() -> u64 {
    5000
}

fn default_cycle_timeout_ms() -> u64 {
    10000
}

fn default_time_series_days() -> u32 {
    30
}

fn default_retry_attempts() -> u32 {
    2
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            cycle_timeout_ms: default_cycle_timeout_ms(),
            time_series_days: default_time_series_days(),
            retry_attempts: default_retry_attempts(),
            demo_mode: false,
        }
    }
}

impl AggregationConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_millis(self.cycle_timeout_ms)
    }
}

/// YouTube Data API 凭据
#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeConfig {
    pub api_key: Option<Secret<String>>,
    pub channel_id: Option<String>,
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,
}

fn default_youtube_base_url() -> String {
    "https://www.googleapis.com".to_string()
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            channel_id: None,
            base_url: default_youtube_base_url(),
        }
    }
}

/// Patreon 创作者访问令牌
#[derive(Debug, Clone, Deserialize)]
pub struct PatreonConfig {
    pub access_token: Option<Secret<String>>,
    #[serde(default = "default_patreon_base_url")]
    pub base_url: String,
}

fn default_patreon_base_url() -> String {
    "https://www.patreon.com".to_string()
}

impl Default for PatreonConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: default_patreon_base_url(),
        }
    }
}

/// Twitch 应用凭据（client credentials）
#[derive(Debug, Clone, Deserialize)]
pub struct TwitchConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<Secret<String>>,
    pub broadcaster_id: Option<String>,
    #[serde(default = "default_twitch_base_url")]
    pub base_url: String,
    #[serde(default = "default_twitch_auth_url")]
    pub auth_url: String,
}

fn default_twitch_base_url() -> String {
    "https://api.twitch.tv".to_string()
}

fn default_twitch_auth_url() -> String {
    "https://id.twitch.tv".to_string()
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            broadcaster_id: None,
            base_url: default_twitch_base_url(),
            auth_url: default_twitch_auth_url(),
        }
    }
}

/// Whop API 密钥
#[derive(Debug, Clone, Deserialize)]
pub struct WhopConfig {
    pub api_key: Option<Secret<String>>,
    #[serde(default = "default_whop_base_url")]
    pub base_url: String,
}

fn default_whop_base_url() -> String {
    "https://api.whop.com".to_string()
}

impl Default for WhopConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_whop_base_url(),
        }
    }
}

/// 各平台凭据
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformsConfig {
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub patreon: PatreonConfig,
    #[serde(default)]
    pub twitch: TwitchConfig,
    #[serde(default)]
    pub whop: WhopConfig,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub platforms: PlatformsConfig,
}

fn default_app_name() -> String {
    "creator-analytics".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            app_env: default_app_env(),
            server: ServerConfig::default(),
            telemetry: TelemetryConfig::default(),
            cache: CacheConfig::default(),
            aggregation: AggregationConfig::default(),
            platforms: PlatformsConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let figment = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("CREATOR_").split("__"));

        Self::from_figment(figment.join(Serialized::default("app_env", env)))
    }

    /// 从任意 figment 提取并校验
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围与平台列表
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_secs == 0 || self.cache.ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "cache.ttl_secs must be within 1..={}",
                MAX_CACHE_TTL_SECS
            )));
        }
        if self.cache.redis_connect_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "cache.redis_connect_timeout_ms must be at most {}",
                MAX_TIMEOUT_MS
            )));
        }
        if self.cache.key.trim().is_empty() {
            return Err(ConfigError::Invalid("cache.key must not be empty".into()));
        }

        let aggregation = &self.aggregation;
        let timeouts = [aggregation.fetch_timeout_ms, aggregation.cycle_timeout_ms];
        if timeouts.iter().any(|&ms| ms == 0 || ms > MAX_TIMEOUT_MS) {
            return Err(ConfigError::Invalid(format!(
                "aggregation timeouts must be within 1..={} ms",
                MAX_TIMEOUT_MS
            )));
        }
        if !(1..=MAX_TIME_SERIES_DAYS).contains(&aggregation.time_series_days) {
            return Err(ConfigError::Invalid(format!(
                "aggregation.time_series_days must be within 1..={}",
                MAX_TIME_SERIES_DAYS
            )));
        }
        if aggregation.retry_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "aggregation.retry_attempts must be at most {}",
                MAX_RETRY_ATTEMPTS
            )));
        }
        if aggregation.platforms.is_empty() {
            return Err(ConfigError::Invalid(
                "aggregation.platforms must list at least one platform".into(),
            ));
        }

        let mut seen = HashSet::new();
        for platform in &aggregation.platforms {
            if !KNOWN_PLATFORMS.contains(&platform.as_str()) {
                return Err(ConfigError::Invalid(format!("unknown platform: {}", platform)));
            }
            if !seen.insert(platform.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate platform: {}", platform)));
            }
        }

        let base_urls = [
            ("platforms.youtube.base_url", &self.platforms.youtube.base_url),
            ("platforms.patreon.base_url", &self.platforms.patreon.base_url),
            ("platforms.twitch.base_url", &self.platforms.twitch.base_url),
            ("platforms.twitch.auth_url", &self.platforms.twitch.auth_url),
            ("platforms.whop.base_url", &self.platforms.whop.base_url),
        ];
        for (field, value) in base_urls {
            url::Url::parse(value)
                .map_err(|e| ConfigError::Invalid(format!("{} is not a valid URL: {}", field, e)))?;
        }

        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
