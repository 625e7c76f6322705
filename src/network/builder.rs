//! Build a citation graph for one topic.

use tracing::{debug, info};

use super::graph::CitationGraph;
use super::harvest::normalize_page;
use super::NetworkError;
use crate::sources::{publication_year_filter, OpenAlexClient, SourceError, Transport};
use crate::store::RecordStore;

/// Default cap on works fetched per build
pub const DEFAULT_MAX_WORKS: usize = 1000;

/// Default page size for work listings
pub const DEFAULT_PER_PAGE: usize = 200;

/// Folds the works of a topic into a [`CitationGraph`]
#[derive(Debug)]
pub struct NetworkBuilder<'a, T: Transport> {
    client: &'a OpenAlexClient<T>,
    max_works: Option<usize>,
    per_page: usize,
    store: Option<&'a RecordStore>,
}

impl<'a, T: Transport> NetworkBuilder<'a, T> {
    pub fn new(client: &'a OpenAlexClient<T>) -> Self {
        Self {
            client,
            max_works: Some(DEFAULT_MAX_WORKS),
            per_page: DEFAULT_PER_PAGE,
            store: None,
        }
    }

    /// Cap on fetched works; `None` walks every page
    pub fn with_max_works(mut self, max_works: Option<usize>) -> Self {
        self.max_works = max_works;
        self
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    /// Also append every fetched page to `store`
    pub fn with_store(mut self, store: &'a RecordStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Resolve a search query to the id of its first matching topic
    async fn resolve_topic(&self, query: &str) -> Result<String, SourceError> {
        let mut topics = self.client.search_topics(query, 10, 1);
        match topics.next().await? {
            Some(topic) => {
                info!(query, topic = %topic, "Resolved query to topic");
                Ok(topic.id)
            }
            None => Err(SourceError::NotFound(format!("No topics found for '{}'", query))),
        }
    }

    /// Build the citation graph of a topic.
    ///
    /// With `is_query` set, `topic` is a search string and the first matching
    /// topic is used. Year bounds are inclusive and either may be omitted.
    pub async fn build_network_for_topic(
        &self,
        topic: &str,
        is_query: bool,
        year_from: Option<i32>,
        year_to: Option<i32>,
    ) -> Result<CitationGraph, NetworkError> {
        let topic_id = if is_query {
            self.resolve_topic(topic).await?
        } else {
            topic.to_string()
        };

        let filter = publication_year_filter(year_from, year_to);
        debug!(topic = %topic_id, filter = ?filter, "Building citation network");

        let mut pager = self
            .client
            .iterate_works_for_topic(&topic_id, self.per_page, self.max_works, filter.as_deref());
        let mut graph = CitationGraph::new();
        let mut fetched = 0usize;

        while let Some(page) = pager.next_page().await? {
            let (works, _) = normalize_page(&page);
            if let Some(store) = self.store {
                store.write_work_nodes_edges(&works)?;
            }
            for work in &works {
                graph.add_work(work);
            }
            fetched += works.len();
        }

        info!(
            topic = %topic_id,
            works = fetched,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Citation network built"
        );
        Ok(graph)
    }
}
