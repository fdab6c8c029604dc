//! YouTube Data API v3
//!
//! 频道统计中的订阅数和总播放量。收入需要 YouTube Analytics 的 OAuth 授权，这里为 0。

use async_trait::async_trait;
use creator_config::YouTubeConfig;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::http::{UpstreamClient, endpoint};
use crate::domain::{FetchError, FetchOutcome, PlatformFetcher, RawPlatformResult};

pub struct YouTubeFetcher {
    client: UpstreamClient,
    base_url: String,
    api_key: Option<Secret<String>>,
    channel_id: Option<String>,
}

impl YouTubeFetcher {
    pub fn new(config: &YouTubeConfig, client: UpstreamClient) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            channel_id: config.channel_id.clone(),
        }
    }
}

#[async_trait]
impl PlatformFetcher for YouTubeFetcher {
    async fn fetch(&self) -> FetchOutcome {
        let (Some(api_key), Some(channel_id)) = (&self.api_key, &self.channel_id) else {
            return Err(FetchError::NotConfigured);
        };

        let url = endpoint(&self.base_url, "/youtube/v3/channels");
        let response: ChannelListResponse = self
            .client
            .send_json("youtube.channels", |http| {
                http.get(&url).query(&[
                    ("part", "statistics"),
                    ("id", channel_id.as_str()),
                    ("key", api_key.expose_secret().as_str()),
                ])
            })
            .await?;

        parse_channels(response)
    }
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    statistics: ChannelStatistics,
}

/// 计数以字符串返回；隐藏订阅数的频道没有 `subscriberCount`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    view_count: Option<String>,
}

fn parse_channels(response: ChannelListResponse) -> FetchOutcome {
    let channel = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Decode("channel not found".into()))?;

    Ok(RawPlatformResult {
        revenue: 0,
        subscribers: parse_count("subscriberCount", channel.statistics.subscriber_count)?,
        views: Some(parse_count("viewCount", channel.statistics.view_count)?),
        ..Default::default()
    })
}

fn parse_count(field: &str, value: Option<String>) -> Result<u64, FetchError> {
    match value {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| FetchError::Decode(format!("{} is not a count: {:?}", field, raw))),
    }
}
