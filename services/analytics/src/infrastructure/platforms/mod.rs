//! 平台抓取实现
//!
//! `build_sources` 按 `aggregation.platforms` 的顺序为每个平台装配 fetcher。

mod demo;
mod http;
mod patreon;
mod twitch;
mod whop;
mod youtube;

use std::sync::Arc;

use creator_config::AppConfig;
use creator_errors::{AppError, AppResult};
use tracing::info;

pub use demo::DemoFetcher;
pub use http::UpstreamClient;
pub use patreon::PatreonFetcher;
pub use twitch::TwitchFetcher;
pub use whop::WhopFetcher;
pub use youtube::YouTubeFetcher;

use crate::application::PlatformSource;
use crate::domain::{PlatformFetcher, PlatformProfile};

/// 根据配置装配所有平台
pub fn build_sources(config: &AppConfig) -> AppResult<Vec<PlatformSource>> {
    let aggregation = &config.aggregation;
    let platforms = &config.platforms;

    aggregation
        .platforms
        .iter()
        .map(|id| -> AppResult<PlatformSource> {
            let profile = PlatformProfile::builtin(id)
                .ok_or_else(|| AppError::validation(format!("unknown platform: {}", id)))?;

            let fetcher: Arc<dyn PlatformFetcher> = if aggregation.demo_mode {
                let demo = DemoFetcher::for_platform(id, aggregation.time_series_days)
                    .ok_or_else(|| AppError::validation(format!("no demo data for {}", id)))?;
                Arc::new(demo)
            } else {
                let client =
                    UpstreamClient::new(aggregation.fetch_timeout(), aggregation.retry_attempts)?;
                match id.as_str() {
                    "youtube" => Arc::new(YouTubeFetcher::new(&platforms.youtube, client)),
                    "patreon" => Arc::new(PatreonFetcher::new(&platforms.patreon, client)),
                    "twitch" => Arc::new(TwitchFetcher::new(&platforms.twitch, client)),
                    "whop" => Arc::new(WhopFetcher::new(&platforms.whop, client)),
                    other => {
                        return Err(AppError::validation(format!("unknown platform: {}", other)));
                    }
                }
            };

            info!(platform = %id, demo = aggregation.demo_mode, "Platform registered");
            Ok(PlatformSource::new(profile, fetcher))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_follow_configured_order() {
        let mut config = AppConfig::default();
        config.aggregation.platforms = vec!["whop".into(), "youtube".into()];

        let sources = build_sources(&config).unwrap();
        let ids: Vec<_> = sources.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["whop", "youtube"]);
        assert_eq!(sources[1].profile.name, "YouTube");
    }

    #[test]
    fn test_rejects_unknown_platform() {
        let mut config = AppConfig::default();
        config.aggregation.platforms = vec!["myspace".into()];
        assert!(build_sources(&config).is_err());
    }

    #[tokio::test]
    async fn test_demo_mode_uses_demo_data() {
        let mut config = AppConfig::default();
        config.aggregation.demo_mode = true;

        let sources = build_sources(&config).unwrap();
        assert_eq!(sources.len(), 4);
        let raw = sources[1].fetcher.fetch().await.unwrap();
        assert_eq!(raw.revenue, 425_000);
    }
}
