//! Remote metadata access for OpenAlex topics and works.
//!
//! The client is written once against the [`Transport`] trait, a single
//! "GET this path with these query parameters and give me JSON" primitive.
//! [`crate::utils::HttpClient`] implements it over HTTP; [`MockTransport`]
//! serves canned pages in tests.
//!
//! # Pagination
//!
//! Listing endpoints are walked with a [`Pager`], an explicit pull-based state
//! machine. Two schemes are supported, one per client:
//!
//! - [`PaginationStyle::Cursor`]: `cursor=*` first, then `meta.next_cursor`
//! - [`PaginationStyle::Page`]: `page=1, 2, ...` until a short page
//!
//! ```rust,no_run
//! use citegraph::sources::OpenAlexClient;
//!
//! # async fn example() -> Result<(), citegraph::sources::SourceError> {
//! let client = OpenAlexClient::new(Default::default())?;
//! let mut works = client.iterate_works_for_topic("T10017", 200, Some(1000), None);
//! while let Some(record) = works.next().await? {
//!     println!("{}", record["id"]);
//! }
//! # Ok(())
//! # }
//! ```

pub mod filter;
pub mod mock;
pub mod normalize;
mod openalex;
mod pager;

pub use filter::{publication_year_filter, FilterBuilder};
pub use mock::MockTransport;
pub use normalize::{normalize_topic, normalize_work};
pub use openalex::{ClientOptions, OpenAlexClient};
pub use pager::{Pager, TopicStream};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query parameters for a single request, in the order they are sent
pub type QueryParams = Vec<(String, String)>;

/// The single request primitive every client operation is built on.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// GET `path` (relative to the API base, e.g. `/topics/T10017`) and decode
    /// the body as JSON
    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value, SourceError>;
}

/// How a listing endpoint hands out the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationStyle {
    /// `meta.next_cursor` tokens, starting from `*`
    #[default]
    Cursor,
    /// `page=N` numbers, with an optional `meta.next_page`
    #[serde(alias = "page_number")]
    Page,
}

impl std::str::FromStr for PaginationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cursor" => Ok(PaginationStyle::Cursor),
            "page" | "page_number" => Ok(PaginationStyle::Page),
            other => Err(format!("unknown pagination style: {}", other)),
        }
    }
}

/// Strip an OpenAlex URI down to its bare id.
///
/// `https://openalex.org/T10017` and `T10017/` both become `T10017`.
pub fn bare_id(id: &str) -> &str {
    id.trim_end_matches('/').rsplit('/').next().unwrap_or(id)
}

/// Errors that can occur when talking to the metadata API
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network-level failure (connect, timeout, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx, non-429 response
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// HTTP 429 that persisted through the single retry
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Response body (or embedded record) is not the JSON we expected
    #[error("Decode error: {0}")]
    Decode(String),

    /// Record is missing its mandatory `id`
    #[error("Validation error: {0}")]
    Validation(String),

    /// Lookup returned 404 or a search returned nothing
    #[error("Not found: {0}")]
    NotFound(String),
}

impl SourceError {
    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Http { status, .. } => Some(*status),
            SourceError::RateLimit => Some(429),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_id() {
        assert_eq!(bare_id("https://openalex.org/T10017"), "T10017");
        assert_eq!(bare_id("https://openalex.org/W4249751050/"), "W4249751050");
        assert_eq!(bare_id("T10017"), "T10017");
    }

    #[test]
    fn test_pagination_style_from_str() {
        assert_eq!("cursor".parse::<PaginationStyle>(), Ok(PaginationStyle::Cursor));
        assert_eq!("PAGE".parse::<PaginationStyle>(), Ok(PaginationStyle::Page));
        assert!("offset".parse::<PaginationStyle>().is_err());
    }

    #[test]
    fn test_error_status() {
        let err = SourceError::Http {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(SourceError::RateLimit.status(), Some(429));
        assert_eq!(SourceError::Decode("x".to_string()).status(), None);
    }
}
