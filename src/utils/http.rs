//! HTTP client utilities.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::retry::{with_rate_limit_retry, RetryConfig};
use crate::sources::{SourceError, Transport};

/// Default OpenAlex API root
pub const OPENALEX_API_BASE: &str = "https://api.openalex.org";

/// Shared HTTP client with sensible defaults
///
/// Every request carries the polite-pool `mailto` parameter when one is set,
/// is bounded by a fixed timeout, and is retried once after a 429.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    base_url: String,
    mailto: Option<String>,
    retry: RetryConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        Self::with_options(base_url, None, Duration::from_secs(30), RetryConfig::default())
    }

    /// Create a new HTTP client
    ///
    /// - `mailto`: contact address for the polite pool (query parameter and User-Agent)
    /// - `timeout`: bound on each request, not overridable per call
    pub fn with_options(
        base_url: &str,
        mailto: Option<String>,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self, SourceError> {
        Url::parse(base_url)
            .map_err(|e| SourceError::Transport(format!("Invalid base URL {}: {}", base_url, e)))?;

        let user_agent = match &mailto {
            Some(email) => format!(
                "{}/{} (mailto:{})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                email
            ),
            None => concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        };

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            mailto: mailto.filter(|m| !m.trim().is_empty()),
            retry,
        })
    }

    /// Build request URL, appending `mailto` if available
    fn build_url(&self, path: &str, params: &[(String, String)]) -> Result<Url, SourceError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url =
            Url::parse(&raw).map_err(|e| SourceError::Transport(format!("Invalid URL {}: {}", raw, e)))?;

        let has_mailto = params.iter().any(|(key, _)| key == "mailto");
        if !params.is_empty() || (self.mailto.is_some() && !has_mailto) {
            let mut pairs = url.query_pairs_mut();
            pairs.extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            if let (Some(email), false) = (&self.mailto, has_mailto) {
                pairs.append_pair("mailto", email);
            }
        }
        Ok(url)
    }

    /// One request, no retry
    async fn send_once(&self, url: &Url) -> Result<Value, SourceError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SourceError::Transport(format!("GET {} failed: {}", url.path(), e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimit);
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Transport(format!("Failed to read body of {}: {}", url.path(), e)))?;

        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| SourceError::Decode(format!("Invalid JSON from {}: {}", url.path(), e)))
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value, SourceError> {
        let url = self.build_url(path, params)?;
        tracing::debug!(url = %url, "GET");
        with_rate_limit_retry(self.retry, || self.send_once(&url)).await
    }
}
