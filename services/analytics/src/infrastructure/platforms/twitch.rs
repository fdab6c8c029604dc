//! Twitch Helix API
//!
//! 应用令牌（client credentials）缓存在 fetcher 内部直到过期，遇到 401/403 时丢弃。
//! 关注者总数作为订阅数，最近 100 个视频的播放量之和作为播放量。

use std::time::Duration;

use async_trait::async_trait;
use creator_config::TwitchConfig;
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::http::{UpstreamClient, endpoint};
use crate::domain::{FetchError, FetchOutcome, PlatformFetcher, RawPlatformResult};

/// 令牌提前失效的余量
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct AppToken {
    value: String,
    expires_at: Instant,
}

pub struct TwitchFetcher {
    client: UpstreamClient,
    base_url: String,
    auth_url: String,
    client_id: Option<String>,
    client_secret: Option<Secret<String>>,
    broadcaster_id: Option<String>,
    token: Mutex<Option<AppToken>>,
}

impl TwitchFetcher {
    pub fn new(config: &TwitchConfig, client: UpstreamClient) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            auth_url: config.auth_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            broadcaster_id: config.broadcaster_id.clone(),
            token: Mutex::new(None),
        }
    }

    async fn app_token(
        &self,
        client_id: &str,
        client_secret: &Secret<String>,
    ) -> Result<String, FetchError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        let url = endpoint(&self.auth_url, "/oauth2/token");
        let response: TokenResponse = self
            .client
            .send_json("twitch.token", |http| {
                http.post(&url).form(&[
                    ("client_id", client_id),
                    ("client_secret", client_secret.expose_secret().as_str()),
                    ("grant_type", "client_credentials"),
                ])
            })
            .await?;

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        debug!(expires_in = response.expires_in, "Twitch app token refreshed");
        *cached = Some(AppToken {
            value: response.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(response.access_token)
    }
}

fn helix(request: RequestBuilder, client_id: &str, token: &str) -> RequestBuilder {
    request.header("Client-Id", client_id).bearer_auth(token)
}

#[async_trait]
impl PlatformFetcher for TwitchFetcher {
    async fn fetch(&self) -> FetchOutcome {
        let (Some(client_id), Some(client_secret), Some(broadcaster_id)) =
            (&self.client_id, &self.client_secret, &self.broadcaster_id)
        else {
            return Err(FetchError::NotConfigured);
        };

        let token = self.app_token(client_id, client_secret).await?;

        let followers_url = endpoint(&self.base_url, "/helix/channels/followers");
        let videos_url = endpoint(&self.base_url, "/helix/videos");
        let followers = self.client.send_json("twitch.followers", |http| {
            helix(http.get(&followers_url), client_id, &token)
                .query(&[("broadcaster_id", broadcaster_id.as_str())])
        });
        let videos = self.client.send_json("twitch.videos", |http| {
            helix(http.get(&videos_url), client_id, &token)
                .query(&[("user_id", broadcaster_id.as_str()), ("first", "100")])
        });

        match futures::try_join!(followers, videos) {
            Ok((followers, videos)) => Ok(summarize(followers, videos)),
            Err(e) => {
                if matches!(e, FetchError::Auth(_)) {
                    *self.token.lock().await = None;
                }
                Err(e)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct FollowersResponse {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    data: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    #[serde(default)]
    view_count: u64,
}

fn summarize(followers: FollowersResponse, videos: VideosResponse) -> RawPlatformResult {
    RawPlatformResult {
        revenue: 0,
        subscribers: followers.total,
        views: Some(
            videos
                .data
                .iter()
                .map(|v| v.view_count)
                .fold(0, u64::saturating_add),
        ),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_followers_and_videos() {
        let followers: FollowersResponse =
            serde_json::from_str(r#"{"total": 892, "data": [], "pagination": {}}"#).unwrap();
        let videos: VideosResponse = serde_json::from_str(
            r#"{"data": [
                {"id": "1", "title": "a", "view_count": 100000},
                {"id": "2", "title": "b", "view_count": 56000}
            ], "pagination": {"cursor": "abc"}}"#,
        )
        .unwrap();

        let raw = summarize(followers, videos);
        assert_eq!(raw.subscribers, 892);
        assert_eq!(raw.views, Some(156_000));
        assert_eq!(raw.revenue, 0);
    }

    #[test]
    fn test_no_videos_means_zero_views() {
        let raw = summarize(
            FollowersResponse { total: 1 },
            serde_json::from_str(r#"{"data": []}"#).unwrap(),
        );
        assert_eq!(raw.views, Some(0));
    }

    #[test]
    fn test_token_response() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token": "abc", "expires_in": 5011271, "token_type": "bearer"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 5_011_271);
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let client = UpstreamClient::new(Duration::from_secs(1), 1).unwrap();
        let config = TwitchConfig {
            client_id: Some("id".into()),
            ..TwitchConfig::default()
        };
        let fetcher = TwitchFetcher::new(&config, client);
        assert_eq!(fetcher.fetch().await, Err(FetchError::NotConfigured));
    }
}
