//! Whop API v2
//!
//! 有效会员数作为订阅数

use async_trait::async_trait;
use creator_config::WhopConfig;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::http::{UpstreamClient, endpoint};
use crate::domain::{FetchError, FetchOutcome, PlatformFetcher, RawPlatformResult};

pub struct WhopFetcher {
    client: UpstreamClient,
    base_url: String,
    api_key: Option<Secret<String>>,
}

impl WhopFetcher {
    pub fn new(config: &WhopConfig, client: UpstreamClient) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl PlatformFetcher for WhopFetcher {
    async fn fetch(&self) -> FetchOutcome {
        let Some(api_key) = &self.api_key else {
            return Err(FetchError::NotConfigured);
        };

        let url = endpoint(&self.base_url, "/api/v2/memberships");
        let page: MembershipPage = self
            .client
            .send_json("whop.memberships", |http| {
                http.get(&url)
                    .query(&[("valid", "true"), ("per", "1")])
                    .bearer_auth(api_key.expose_secret())
            })
            .await?;

        Ok(RawPlatformResult {
            subscribers: page.pagination.total_count,
            ..Default::default()
        })
    }
}

#[derive(Debug, Deserialize)]
struct MembershipPage {
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_total_count() {
        let page: MembershipPage = serde_json::from_str(
            r#"{
                "pagination": {"current_page": 1, "total_page": 43, "total_count": 43},
                "data": [{"id": "mem_1", "valid": true}]
            }"#,
        )
        .unwrap();
        assert_eq!(page.pagination.total_count, 43);
    }

    #[test]
    fn test_missing_pagination_is_rejected() {
        assert!(serde_json::from_str::<MembershipPage>(r#"{"data":[]}"#).is_err());
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = UpstreamClient::new(std::time::Duration::from_secs(1), 1).unwrap();
        let fetcher = WhopFetcher::new(&WhopConfig::default(), client);
        assert_eq!(fetcher.fetch().await, Err(FetchError::NotConfigured));
    }
}
