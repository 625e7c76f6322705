//! OpenAlex topic/work client.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::filter::FilterBuilder;
use super::{bare_id, normalize_topic, normalize_work, PaginationStyle, Pager, SourceError, TopicStream, Transport};
use crate::models::{Topic, Work};
use crate::utils::{HttpClient, RetryConfig, OPENALEX_API_BASE};

/// Settings for an [`OpenAlexClient`] talking HTTP
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API root
    pub base_url: String,
    /// Contact address for the polite pool
    pub mailto: Option<String>,
    /// Pagination scheme used for every listing
    pub pagination: PaginationStyle,
    /// Fixed per-request timeout
    pub request_timeout: Duration,
    /// Idle delay between successive page requests
    pub page_delay: Duration,
    /// Wait before the single retry after a 429
    pub rate_limit_backoff: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: OPENALEX_API_BASE.to_string(),
            mailto: None,
            pagination: PaginationStyle::Cursor,
            request_timeout: Duration::from_secs(30),
            page_delay: Duration::from_millis(500),
            rate_limit_backoff: Duration::from_secs(1),
        }
    }
}

/// Client for the topic and work endpoints
///
/// Listing operations return lazy, single-use sequences; calling them again
/// starts over from the first page.
#[derive(Debug)]
pub struct OpenAlexClient<T: Transport = HttpClient> {
    transport: T,
    pagination: PaginationStyle,
    page_delay: Duration,
}

impl OpenAlexClient<HttpClient> {
    /// Create an HTTP-backed client
    pub fn new(options: ClientOptions) -> Result<Self, SourceError> {
        let transport = HttpClient::with_options(
            &options.base_url,
            options.mailto.clone(),
            options.request_timeout,
            RetryConfig::with_backoff(options.rate_limit_backoff),
        )?;
        Ok(Self::with_transport(transport, options.pagination, options.page_delay))
    }
}

impl<T: Transport> OpenAlexClient<T> {
    /// Create a client over any transport
    pub fn with_transport(transport: T, pagination: PaginationStyle, page_delay: Duration) -> Self {
        Self {
            transport,
            pagination,
            page_delay,
        }
    }

    /// The transport requests go through
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Pagination scheme in use
    pub fn pagination(&self) -> PaginationStyle {
        self.pagination
    }

    fn pager(&self, path: impl Into<String>, params: Vec<(String, String)>, per_page: usize) -> Pager<'_, T> {
        Pager::new(&self.transport, path, params, self.pagination, per_page).with_page_delay(self.page_delay)
    }

    /// Retrieve a single topic by bare id (`T10017`) or full URI.
    pub async fn get_topic(&self, topic_id: &str) -> Result<Topic, SourceError> {
        let tid = bare_id(topic_id);
        let mut data = self.transport.get_json(&format!("/topics/{}", tid), &[]).await?;

        // Some responses omit the id; fall back to the one we asked for.
        if data.get("id").and_then(Value::as_str).is_none() {
            if let Some(obj) = data.as_object_mut() {
                obj.insert("id".to_string(), Value::String(tid.to_string()));
            }
        }
        normalize_topic(&data)
    }

    /// Search topics by name.
    ///
    /// Stops after `max_pages` pages or when the API has no further page.
    pub fn search_topics(&self, query: &str, per_page: usize, max_pages: usize) -> TopicStream<'_, T> {
        debug!(query, per_page, max_pages, "Searching topics");
        let params = vec![("search".to_string(), query.to_string())];
        TopicStream::new(self.pager("/topics", params, per_page).with_max_pages(Some(max_pages)))
    }

    /// Stream raw work records tagged with a topic.
    ///
    /// `filter` is an extra filter expression joined onto the topic filter.
    /// `max_results` truncates mid-page without fetching further pages.
    pub fn iterate_works_for_topic(
        &self,
        topic_id: &str,
        per_page: usize,
        max_results: Option<usize>,
        filter: Option<&str>,
    ) -> Pager<'_, T> {
        let tid = bare_id(topic_id);
        let mut builder = FilterBuilder::new().equals("topics.id", tid);
        if let Some(extra) = filter {
            builder = builder.raw(extra);
        }
        let params = builder
            .build()
            .map(|f| vec![("filter".to_string(), f)])
            .unwrap_or_default();

        self.pager("/works", params, per_page).with_max_items(max_results)
    }

    /// Collect up to `max_items` normalized works for a topic.
    ///
    /// Records without an id are skipped.
    pub async fn get_works_for_topic(
        &self,
        topic_id: &str,
        per_page: usize,
        max_items: usize,
    ) -> Result<Vec<Work>, SourceError> {
        let mut pager = self.iterate_works_for_topic(topic_id, per_page, Some(max_items), None);
        let mut works = Vec::new();
        while let Some(record) = pager.next().await? {
            match normalize_work(&record) {
                Ok(work) => works.push(work),
                Err(e) => warn!("Skipping work record: {}", e),
            }
        }
        Ok(works)
    }

    /// Retrieve a single work by bare id (`W4249751050`) or full URI.
    pub async fn get_work(&self, work_id: &str) -> Result<Work, SourceError> {
        let data = self
            .transport
            .get_json(&format!("/works/{}", bare_id(work_id)), &[])
            .await?;
        normalize_work(&data)
    }
}
