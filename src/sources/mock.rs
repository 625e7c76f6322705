//! Mock transport for testing purposes.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::sources::{SourceError, Transport};

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of the first query parameter called `name`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A transport that serves predefined responses per path, in order.
///
/// Paths registered with [`MockTransport::set_endless`] answer every request
/// not covered by a queued response with a full page of fresh work records.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, SourceError>>>>,
    endless: Mutex<HashMap<String, usize>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response body for `path`.
    pub fn push_body(&self, path: &str, body: Value) {
        self.push(path, Ok(body));
    }

    /// Queue a listing page (`{"results": [...], "meta": {...}}`) for `path`.
    pub fn push_page(&self, path: &str, results: Vec<Value>, meta: Value) {
        self.push_body(path, json!({ "results": results, "meta": meta }));
    }

    /// Queue an error for `path`.
    pub fn push_error(&self, path: &str, error: SourceError) {
        self.push(path, Err(error));
    }

    /// Serve unlimited full pages of `page_size` records for `path`.
    pub fn set_endless(&self, path: &str, page_size: usize) {
        let mut guard = self.endless.lock().unwrap();
        guard.insert(path.to_string(), page_size);
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn push(&self, path: &str, response: Result<Value, SourceError>) {
        let mut guard = self.responses.lock().unwrap();
        guard.entry(path.to_string()).or_default().push_back(response);
    }

    fn endless_page(&self, path: &str, request_index: usize) -> Option<Value> {
        let page_size = *self.endless.lock().unwrap().get(path)?;
        let results: Vec<Value> = (0..page_size)
            .map(|i| {
                json!({
                    "id": format!("https://openalex.org/W{}{:04}", request_index + 1, i),
                    "title": format!("Generated work {}-{}", request_index + 1, i),
                    "referenced_works": []
                })
            })
            .collect();
        Some(json!({
            "results": results,
            "meta": { "next_cursor": format!("cursor-{}", request_index + 1) }
        }))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value, SourceError> {
        let request_index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(RecordedRequest {
                path: path.to_string(),
                params: params.to_vec(),
            });
            requests.len() - 1
        };

        let queued = {
            let mut guard = self.responses.lock().unwrap();
            guard.get_mut(path).and_then(VecDeque::pop_front)
        };

        match queued {
            Some(response) => response,
            None => self
                .endless_page(path, request_index)
                .ok_or_else(|| SourceError::NotFound(format!("no canned response for {}", path))),
        }
    }
}

/// Helper function to create a raw work record for testing.
pub fn make_work_record(id: &str, title: &str, references: &[&str]) -> Value {
    json!({
        "id": id,
        "title": title,
        "publication_year": 2020,
        "referenced_works": references,
    })
}
