//! Patreon API v2
//!
//! 使用创作者访问令牌读取第一个 campaign 的赞助人数和每月认捐总额（分）。

use async_trait::async_trait;
use creator_config::PatreonConfig;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::http::{UpstreamClient, endpoint};
use crate::domain::{FetchError, FetchOutcome, PlatformFetcher, RawPlatformResult};

pub struct PatreonFetcher {
    client: UpstreamClient,
    base_url: String,
    access_token: Option<Secret<String>>,
}

impl PatreonFetcher {
    pub fn new(config: &PatreonConfig, client: UpstreamClient) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            access_token: config.access_token.clone(),
        }
    }
}

#[async_trait]
impl PlatformFetcher for PatreonFetcher {
    async fn fetch(&self) -> FetchOutcome {
        let Some(token) = &self.access_token else {
            return Err(FetchError::NotConfigured);
        };

        let url = endpoint(&self.base_url, "/api/oauth2/v2/campaigns");
        let document: CampaignDocument = self
            .client
            .send_json("patreon.campaigns", |http| {
                http.get(&url)
                    .query(&[("fields[campaign]", "patron_count,pledge_sum")])
                    .bearer_auth(token.expose_secret())
            })
            .await?;

        parse_campaigns(document)
    }
}

#[derive(Debug, Deserialize)]
struct CampaignDocument {
    data: Vec<Campaign>,
}

#[derive(Debug, Deserialize)]
struct Campaign {
    attributes: CampaignAttributes,
}

#[derive(Debug, Deserialize)]
struct CampaignAttributes {
    #[serde(default)]
    patron_count: u64,
    #[serde(default)]
    pledge_sum: u64,
}

fn parse_campaigns(document: CampaignDocument) -> FetchOutcome {
    let campaign = document
        .data
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Decode("no campaign for this token".into()))?;

    Ok(RawPlatformResult {
        revenue: campaign.attributes.pledge_sum,
        subscribers: campaign.attributes.patron_count,
        ..Default::default()
    })
}
