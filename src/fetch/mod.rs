//! Upstream game-data API access.
//!
//! [`MatchApi`] is the seam the pipeline talks to; [`RiotClient`] implements it
//! over HTTPS with an explicit per-request timeout.

pub mod dto;
mod normalize;

#[cfg(test)]
pub(crate) use normalize::fixtures;
pub use normalize::summarize_match;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::RegionRoute;
use dto::{AccountDto, MatchDto};

/// Header carrying the caller-supplied credential.
pub const TOKEN_HEADER: &str = "X-Riot-Token";

/// Upstream rejects match-id listings larger than this.
pub const MAX_MATCH_IDS_PER_REQUEST: u32 = 100;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Timeouts, connection failures and rate limiting.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::RateLimited { .. } => true,
            _ => false,
        }
    }
}

/// Caller-supplied API credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(***)")
    }
}

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Base URL with a `{host}` placeholder for the routing host
    pub base_url_template: String,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url_template: "https://{host}.api.riotgames.com".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

/// The three upstream operations the analyzer consumes.
#[async_trait]
pub trait MatchApi: Send + Sync {
    /// Resolve a display name and tag to an account.
    async fn account_by_riot_id(
        &self,
        route: RegionRoute,
        key: &ApiKey,
        game_name: &str,
        tag_line: &str,
    ) -> Result<AccountDto, FetchError>;

    /// List recent match ids, most recent first.
    async fn match_ids(
        &self,
        route: RegionRoute,
        key: &ApiKey,
        player_id: &str,
        count: u32,
    ) -> Result<Vec<String>, FetchError>;

    /// Fetch a full match payload.
    async fn match_detail(
        &self,
        route: RegionRoute,
        key: &ApiKey,
        match_id: &str,
    ) -> Result<MatchDto, FetchError>;
}

/// HTTPS client for the upstream API.
pub struct RiotClient {
    client: Client,
    config: FetcherConfig,
}

impl RiotClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("team-gauge/0.1.0")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a client with default configuration.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetcherConfig::default())
    }

    /// Build an endpoint URL on `host`, percent-encoding each path segment.
    fn endpoint(&self, host: &str, segments: &[&str]) -> Result<Url, FetchError> {
        let base = self.config.base_url_template.replace("{host}", host);
        let mut url =
            Url::parse(&base).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(base.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, key: &ApiKey) -> Result<T, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.as_str())
            .header(TOKEN_HEADER, key.expose())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl MatchApi for RiotClient {
    async fn account_by_riot_id(
        &self,
        route: RegionRoute,
        key: &ApiKey,
        game_name: &str,
        tag_line: &str,
    ) -> Result<AccountDto, FetchError> {
        let url = self.endpoint(
            route.continental_host,
            &["riot", "account", "v1", "accounts", "by-riot-id", game_name, tag_line],
        )?;
        self.get_json(url, key).await
    }

    async fn match_ids(
        &self,
        route: RegionRoute,
        key: &ApiKey,
        player_id: &str,
        count: u32,
    ) -> Result<Vec<String>, FetchError> {
        let mut url = self.endpoint(
            route.continental_host,
            &["lol", "match", "v5", "matches", "by-puuid", player_id, "ids"],
        )?;
        url.query_pairs_mut()
            .append_pair("count", &count.min(MAX_MATCH_IDS_PER_REQUEST).to_string());
        self.get_json(url, key).await
    }

    async fn match_detail(
        &self,
        route: RegionRoute,
        key: &ApiKey,
        match_id: &str,
    ) -> Result<MatchDto, FetchError> {
        let url = self.endpoint(
            route.continental_host,
            &["lol", "match", "v5", "matches", match_id],
        )?;
        self.get_json(url, key).await
    }
}
