//! Pull-based pagination over listing endpoints.
//!
//! A [`Pager`] fetches one page per call to [`Pager::next_page`] and stops for
//! good on the first of: exhausted pagination state, an empty page, the page
//! cap, the item cap, or an error. Records can also be pulled one at a time
//! with [`Pager::next`], which refills an internal buffer page by page.

use std::collections::VecDeque;

use serde_json::Value;
use tokio::time::{sleep, Duration};
use tracing::debug;

use super::{normalize_topic, PaginationStyle, SourceError, Transport};
use crate::models::Topic;

/// Where the next request starts
#[derive(Debug, Clone, PartialEq, Eq)]
enum PageState {
    /// Next cursor token (`*` for the first page)
    Cursor(String),
    /// Next 1-based page number
    Page(u64),
}

impl PageState {
    fn initial(style: PaginationStyle) -> Self {
        match style {
            PaginationStyle::Cursor => PageState::Cursor("*".to_string()),
            PaginationStyle::Page => PageState::Page(1),
        }
    }

    fn as_param(&self) -> (String, String) {
        match self {
            PageState::Cursor(cursor) => ("cursor".to_string(), cursor.clone()),
            PageState::Page(page) => ("page".to_string(), page.to_string()),
        }
    }
}

/// A finite, single-use walk over a paginated endpoint.
///
/// Create a fresh pager to start again from the first page.
#[derive(Debug)]
pub struct Pager<'a, T: Transport + ?Sized> {
    transport: &'a T,
    path: String,
    params: Vec<(String, String)>,
    per_page: usize,
    page_delay: Duration,
    state: PageState,
    max_pages: Option<usize>,
    remaining: Option<usize>,
    pages_fetched: usize,
    items_yielded: usize,
    done: bool,
    buffer: VecDeque<Value>,
}

impl<'a, T: Transport + ?Sized> Pager<'a, T> {
    /// Create a pager for `path` with the given base query parameters.
    ///
    /// `per-page` and the cursor/page parameter are added per request.
    pub fn new(
        transport: &'a T,
        path: impl Into<String>,
        params: Vec<(String, String)>,
        style: PaginationStyle,
        per_page: usize,
    ) -> Self {
        Self {
            transport,
            path: path.into(),
            params,
            per_page: per_page.max(1),
            page_delay: Duration::ZERO,
            state: PageState::initial(style),
            max_pages: None,
            remaining: None,
            pages_fetched: 0,
            items_yielded: 0,
            done: false,
            buffer: VecDeque::new(),
        }
    }

    /// Sleep this long before every request after the first
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Fetch at most this many pages
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Yield at most this many records in total
    pub fn with_max_items(mut self, max_items: Option<usize>) -> Self {
        self.remaining = max_items;
        self
    }

    /// Number of requests issued so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Whether no further request will be made
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetch the next page of raw records.
    ///
    /// Returns `Ok(None)` once the walk is over. The last page is truncated to
    /// the item cap. An error ends the walk.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>, SourceError> {
        if self.done {
            return Ok(None);
        }
        if self.max_pages.is_some_and(|max| self.pages_fetched >= max)
            || self.remaining == Some(0)
        {
            self.done = true;
            return Ok(None);
        }

        if self.pages_fetched > 0 && !self.page_delay.is_zero() {
            sleep(self.page_delay).await;
        }

        let mut params = self.params.clone();
        params.push(("per-page".to_string(), self.per_page.to_string()));
        params.push(self.state.as_param());

        debug!(
            path = %self.path,
            state = ?self.state,
            items = self.items_yielded,
            "Fetching page {}",
            self.pages_fetched + 1
        );
        let mut body = match self.transport.get_json(&self.path, &params).await {
            Ok(body) => body,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        self.pages_fetched += 1;

        let mut results = match body.get_mut("results").map(Value::take) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(results)) => results,
            Some(_) => {
                self.done = true;
                return Err(SourceError::Decode(format!(
                    "'results' in response from {} is not a list",
                    self.path
                )));
            }
        };

        if results.is_empty() {
            self.done = true;
            return Ok(None);
        }

        self.advance(body.get("meta"), results.len());

        if let Some(remaining) = self.remaining {
            if results.len() >= remaining {
                results.truncate(remaining);
                self.remaining = Some(0);
                self.done = true;
            } else {
                self.remaining = Some(remaining - results.len());
            }
        }

        self.items_yielded += results.len();
        Ok(Some(results))
    }

    /// Pull the next raw record, fetching pages as needed
    pub async fn next(&mut self) -> Result<Option<Value>, SourceError> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            match self.next_page().await? {
                Some(page) => self.buffer.extend(page),
                None => return Ok(None),
            }
        }
    }

    /// Collect every remaining record
    pub async fn collect_all(mut self) -> Result<Vec<Value>, SourceError> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    fn advance(&mut self, meta: Option<&Value>, page_len: usize) {
        let meta = meta.unwrap_or(&Value::Null);
        match self.state {
            PageState::Cursor(_) => match meta.get("next_cursor").and_then(Value::as_str) {
                Some(next) if !next.is_empty() => self.state = PageState::Cursor(next.to_string()),
                _ => self.done = true,
            },
            PageState::Page(page) => {
                let next_page = meta.get("next_page").filter(|v| !v.is_null());
                if next_page.is_none() && page_len < self.per_page {
                    self.done = true;
                } else {
                    let next = next_page.and_then(Value::as_u64).unwrap_or(page + 1);
                    self.state = PageState::Page(next);
                }
            }
        }
    }
}

/// Topic search results, normalized as they are pulled
#[derive(Debug)]
pub struct TopicStream<'a, T: Transport + ?Sized> {
    pager: Pager<'a, T>,
}

impl<'a, T: Transport + ?Sized> TopicStream<'a, T> {
    pub(crate) fn new(pager: Pager<'a, T>) -> Self {
        Self { pager }
    }

    /// Pull the next topic
    pub async fn next(&mut self) -> Result<Option<Topic>, SourceError> {
        match self.pager.next().await? {
            Some(record) => normalize_topic(&record).map(Some),
            None => Ok(None),
        }
    }

    /// Collect every remaining topic
    pub async fn collect_all(mut self) -> Result<Vec<Topic>, SourceError> {
        let mut topics = Vec::new();
        while let Some(topic) = self.next().await? {
            topics.push(topic);
        }
        Ok(topics)
    }

    /// Requests issued so far
    pub fn pages_fetched(&self) -> usize {
        self.pager.pages_fetched()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockTransport;
    use serde_json::json;

    fn records(prefix: &str, n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!({"id": format!("https://openalex.org/{}{}", prefix, i)}))
            .collect()
    }

    #[tokio::test]
    async fn test_page_style_stops_on_short_page() {
        let per_page = 5;
        let transport = MockTransport::new();
        transport.push_page("/works", records("A", per_page), json!({}));
        transport.push_page("/works", records("B", per_page), json!({}));
        transport.push_page("/works", records("C", 3), json!({}));
        transport.push_page("/works", records("D", per_page), json!({}));

        let pager = Pager::new(&transport, "/works", Vec::new(), PaginationStyle::Page, per_page);
        let all = pager.collect_all().await.unwrap();

        assert_eq!(all.len(), 2 * per_page + 3);
        assert_eq!(transport.request_count(), 3);
        let pages: Vec<_> = transport
            .requests()
            .iter()
            .map(|r| r.param("page").unwrap_or_default().to_string())
            .collect();
        assert_eq!(pages, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_cursor_style_follows_next_cursor() {
        let per_page = 4;
        let transport = MockTransport::new();
        transport.push_page("/works", records("A", per_page), json!({"next_cursor": "c2"}));
        transport.push_page("/works", records("B", per_page), json!({"next_cursor": "c3"}));
        transport.push_page("/works", records("C", 3), json!({"next_cursor": null}));

        let pager = Pager::new(&transport, "/works", Vec::new(), PaginationStyle::Cursor, per_page);
        let all = pager.collect_all().await.unwrap();

        assert_eq!(all.len(), 2 * per_page + 3);
        let cursors: Vec<_> = transport
            .requests()
            .iter()
            .map(|r| r.param("cursor").unwrap_or_default().to_string())
            .collect();
        assert_eq!(cursors, vec!["*", "c2", "c3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_pages() {
        let delay = Duration::from_millis(150);
        let transport = MockTransport::new();
        transport.set_endless("/works", 2);

        let mut pager = Pager::new(&transport, "/works", Vec::new(), PaginationStyle::Cursor, 2)
            .with_page_delay(delay)
            .with_max_pages(Some(3));

        let start = tokio::time::Instant::now();
        pager.next_page().await.unwrap().unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);

        while pager.next_page().await.unwrap().is_some() {}
        let elapsed = start.elapsed();

        assert_eq!(transport.request_count(), 3);
        assert!(elapsed >= delay * 2, "elapsed {:?}", elapsed);
        assert!(elapsed < delay * 3, "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_item_cap_truncates_mid_page() {
        let transport = MockTransport::new();
        transport.set_endless("/works", 5);

        let mut pager = Pager::new(&transport, "/works", Vec::new(), PaginationStyle::Page, 5)
            .with_max_items(Some(7));

        let mut count = 0;
        while pager.next().await.unwrap().is_some() {
            count += 1;
        }

        assert_eq!(count, 7);
        assert_eq!(transport.request_count(), 2);
        assert!(pager.is_done());
    }

    #[tokio::test]
    async fn test_item_cap_on_page_boundary_issues_no_extra_request() {
        let transport = MockTransport::new();
        transport.set_endless("/works", 5);

        let pager = Pager::new(&transport, "/works", Vec::new(), PaginationStyle::Cursor, 5)
            .with_max_items(Some(10));
        assert_eq!(pager.collect_all().await.unwrap().len(), 10);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_max_pages() {
        let transport = MockTransport::new();
        transport.set_endless("/topics", 3);

        let pager = Pager::new(&transport, "/topics", Vec::new(), PaginationStyle::Cursor, 3)
            .with_max_pages(Some(2));
        assert_eq!(pager.collect_all().await.unwrap().len(), 6);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let transport = MockTransport::new();
        transport.push_page("/works", Vec::new(), json!({"next_cursor": "never-used"}));

        let mut pager = Pager::new(&transport, "/works", Vec::new(), PaginationStyle::Cursor, 5);
        assert!(pager.next_page().await.unwrap().is_none());
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_error_ends_the_walk() {
        let transport = MockTransport::new();
        transport.push_page("/works", records("A", 2), json!({"next_cursor": "c2"}));
        transport.push_error("/works", SourceError::Http { status: 500, body: "boom".to_string() });

        let mut pager = Pager::new(&transport, "/works", Vec::new(), PaginationStyle::Cursor, 2);
        assert_eq!(pager.next_page().await.unwrap().unwrap().len(), 2);
        assert!(matches!(pager.next_page().await, Err(SourceError::Http { status: 500, .. })));
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_non_list_results_is_decode_error() {
        let transport = MockTransport::new();
        transport.push_body("/works", json!({"results": {"id": "W1"}}));

        let mut pager = Pager::new(&transport, "/works", Vec::new(), PaginationStyle::Cursor, 2);
        assert!(matches!(pager.next_page().await, Err(SourceError::Decode(_))));
    }

    #[tokio::test]
    async fn test_page_style_uses_numeric_next_page() {
        let transport = MockTransport::new();
        transport.push_page("/works", records("A", 2), json!({"next_page": 5}));
        transport.push_page("/works", records("B", 1), json!({"next_page": null}));

        let pager = Pager::new(&transport, "/works", Vec::new(), PaginationStyle::Page, 2);
        assert_eq!(pager.collect_all().await.unwrap().len(), 3);
        assert_eq!(transport.requests()[1].param("page"), Some("5"));
    }
}
