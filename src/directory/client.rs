/// HTTP client for the upstream guild directory
use crate::{
    config::UpstreamConfig,
    crypto::Address,
    directory::{AccessEntry, Community, CommunityDetail, CommunityId, DirectoryClient},
    error::{GuildError, GuildResult},
    metrics,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::debug;

/// Directory client configuration
#[derive(Debug, Clone)]
pub struct DirectoryClientConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// User-Agent header for HTTP requests
    pub user_agent: String,
}

impl From<&UpstreamConfig> for DirectoryClientConfig {
    fn from(config: &UpstreamConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// reqwest-backed directory client
#[derive(Clone)]
pub struct HttpDirectoryClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpDirectoryClient {
    /// Create a new directory client
    pub fn new(config: DirectoryClientConfig) -> GuildResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GuildError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url,
        })
    }

    fn catalog_url(&self) -> String {
        format!("{}/guild", self.base_url)
    }

    fn detail_url(&self, id: CommunityId) -> String {
        format!("{}/guild/{}", self.base_url, id)
    }

    fn access_url(&self, id: CommunityId, address: &Address) -> String {
        format!("{}/guild/access/{}/{}", self.base_url, id, address)
    }

    /// GET a JSON document, recording latency and outcome under `endpoint`
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: &str) -> GuildResult<T> {
        let start = Instant::now();
        let result = self.fetch(url).await;
        metrics::record_upstream_request(endpoint, result.is_ok(), start.elapsed().as_secs_f64());

        debug!(
            endpoint,
            url,
            ok = result.is_ok(),
            duration_ms = start.elapsed().as_millis() as u64,
            "upstream request"
        );

        result
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> GuildResult<T> {
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(GuildError::Upstream(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn fetch_communities(&self) -> GuildResult<Vec<Community>> {
        self.get_json("catalog", &self.catalog_url()).await
    }

    async fn fetch_detail(&self, id: CommunityId) -> GuildResult<Option<CommunityDetail>> {
        self.get_json("detail", &self.detail_url(id)).await
    }

    async fn fetch_access(
        &self,
        id: CommunityId,
        address: &Address,
    ) -> GuildResult<Option<Vec<AccessEntry>>> {
        self.get_json("access", &self.access_url(id, address)).await
    }
}
