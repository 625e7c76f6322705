//! Utility modules supporting API access.
//!
//! - [`HttpClient`]: reqwest-backed [`crate::sources::Transport`] with a fixed
//!   timeout, polite-pool `mailto`, and rate-limit retry
//! - [`RetryConfig`]: backoff applied before the single retry after HTTP 429
//! - [`with_rate_limit_retry`]: run an operation with that retry policy
//!
//! # Retry on rate limit
//!
//! ```rust,no_run
//! use citegraph::utils::{with_rate_limit_retry, RetryConfig};
//! use citegraph::sources::SourceError;
//!
//! # async fn fetch_data() -> Result<String, SourceError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let result = with_rate_limit_retry(RetryConfig::default(), fetch_data).await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod retry;

pub use http::{HttpClient, OPENALEX_API_BASE};
pub use retry::{with_rate_limit_retry, RetryConfig};
