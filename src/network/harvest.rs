//! Fetch-normalize-persist pipeline for one topic.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::NetworkError;
use crate::models::Work;
use crate::sources::{normalize_work, OpenAlexClient, Transport};
use crate::store::RecordStore;

/// Totals for one harvest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub pages: usize,
    pub works: usize,
    pub edges: usize,
    /// Records dropped because they had no usable id
    pub skipped: usize,
}

/// Normalize a page of raw records, dropping those without an id.
///
/// Returns the works and the number of records dropped.
pub(crate) fn normalize_page(records: &[Value]) -> (Vec<Work>, usize) {
    let mut works = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for record in records {
        match normalize_work(record) {
            Ok(work) => works.push(work),
            Err(e) => {
                skipped += 1;
                warn!("Skipping work record: {}", e);
            }
        }
    }
    (works, skipped)
}

/// Stream every work of a topic into `store`, one page per write.
///
/// Pages written before an error stay on disk.
pub async fn harvest_topic<T: Transport>(
    client: &OpenAlexClient<T>,
    store: &RecordStore,
    topic_id: &str,
    per_page: usize,
    max_results: Option<usize>,
    filter: Option<&str>,
) -> Result<HarvestSummary, NetworkError> {
    let mut pager = client.iterate_works_for_topic(topic_id, per_page, max_results, filter);
    let mut summary = HarvestSummary::default();

    while let Some(page) = pager.next_page().await? {
        let (works, skipped) = normalize_page(&page);
        let written = store.write_work_nodes_edges(&works)?;

        summary.pages += 1;
        summary.works += written.nodes;
        summary.edges += written.edges;
        summary.skipped += skipped;
        debug!(page = summary.pages, works = written.nodes, "Harvested page");
    }

    info!(
        topic = topic_id,
        pages = summary.pages,
        works = summary.works,
        edges = summary.edges,
        skipped = summary.skipped,
        "Harvest complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::make_work_record;
    use crate::sources::{MockTransport, PaginationStyle, SourceError};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    fn client(transport: MockTransport) -> OpenAlexClient<MockTransport> {
        OpenAlexClient::with_transport(transport, PaginationStyle::Cursor, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_harvest_writes_each_page() {
        let transport = MockTransport::new();
        transport.push_page(
            "/works",
            vec![
                make_work_record("https://openalex.org/W1", "One", &["https://openalex.org/W5", "https://openalex.org/W6"]),
                json!({"title": "missing id"}),
            ],
            json!({"next_cursor": "c2"}),
        );
        transport.push_page(
            "/works",
            vec![make_work_record("https://openalex.org/W2", "Two", &["https://openalex.org/W5"])],
            json!({"next_cursor": null}),
        );
        let client = client(transport);
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("works.jsonl"), dir.path().join("edges.csv"));

        let summary = harvest_topic(&client, &store, "T10017", 2, None, None).await.unwrap();

        assert_eq!(
            summary,
            HarvestSummary {
                pages: 2,
                works: 2,
                edges: 3,
                skipped: 1
            }
        );
        assert_eq!(store.read_nodes().unwrap().len(), 2);
        assert_eq!(store.read_edges().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_harvest_keeps_pages_written_before_error() {
        let transport = MockTransport::new();
        transport.push_page(
            "/works",
            vec![make_work_record("https://openalex.org/W1", "One", &[])],
            json!({"next_cursor": "c2"}),
        );
        transport.push_error("/works", SourceError::Http { status: 500, body: "boom".into() });
        let client = client(transport);
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("works.jsonl"), dir.path().join("edges.csv"));

        let result = harvest_topic(&client, &store, "T1", 1, None, None).await;

        assert!(matches!(
            result,
            Err(NetworkError::Source(SourceError::Http { status: 500, .. }))
        ));
        assert_eq!(store.read_nodes().unwrap().len(), 1);
    }
}
