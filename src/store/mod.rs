//! Durable, append-only storage for works and their reference edges.
//!
//! Works go to a JSON-lines node file and edges to a header-less CSV edge
//! file. Both paths are given to [`RecordStore::new`]; nothing here falls back
//! to a default location.

mod reader;
mod writer;

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::models::{build_reference_edges, ReferenceEdge, Work};

pub use reader::{parse_concatenated, read_edges, read_records, read_records_by_key};
pub use writer::{append_edges, append_json_lines};

/// Errors that can occur while writing or reading store files
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Counts returned by a combined node and edge write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// A pair of node and edge files
#[derive(Debug, Clone)]
pub struct RecordStore {
    node_file: PathBuf,
    edge_file: PathBuf,
}

impl RecordStore {
    pub fn new(node_file: impl Into<PathBuf>, edge_file: impl Into<PathBuf>) -> Self {
        Self {
            node_file: node_file.into(),
            edge_file: edge_file.into(),
        }
    }

    pub fn node_file(&self) -> &Path {
        &self.node_file
    }

    pub fn edge_file(&self) -> &Path {
        &self.edge_file
    }

    /// Append records to the node file, one JSON object per line
    pub fn append_nodes<T: Serialize>(&self, records: &[T]) -> Result<usize, StoreError> {
        append_json_lines(&self.node_file, records)
    }

    /// Append edges to the edge file
    pub fn append_edges(&self, edges: &[ReferenceEdge]) -> Result<usize, StoreError> {
        append_edges(&self.edge_file, edges)
    }

    /// Write a page of works: all nodes in one append, then all of their
    /// edges in one append.
    ///
    /// An empty batch touches neither file.
    pub fn write_work_nodes_edges(&self, works: &[Work]) -> Result<WriteSummary, StoreError> {
        if works.is_empty() {
            return Ok(WriteSummary::default());
        }

        let nodes = self.append_nodes(works)?;
        let edges: Vec<ReferenceEdge> = works.iter().flat_map(build_reference_edges).collect();
        let edges = self.append_edges(&edges)?;

        info!(nodes, edges, "Appended works to {}", self.node_file.display());
        Ok(WriteSummary { nodes, edges })
    }

    /// Read back every record in the node file
    pub fn read_nodes(&self) -> Result<Vec<Value>, StoreError> {
        read_records(&self.node_file)
    }

    /// Read back every edge in the edge file
    pub fn read_edges(&self) -> Result<Vec<ReferenceEdge>, StoreError> {
        read_edges(&self.edge_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkBuilder;
    use std::fs;
    use tempfile::tempdir;

    fn sample_works() -> Vec<Work> {
        vec![
            WorkBuilder::new("https://openalex.org/W1")
                .title("First")
                .publication_year(2001)
                .references(["https://openalex.org/W7", "https://openalex.org/W8"])
                .build(),
            WorkBuilder::new("https://openalex.org/W2").title("Second").build(),
        ]
    }

    #[test]
    fn test_write_work_nodes_edges() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("works.jsonl"), dir.path().join("edges.csv"));

        let summary = store.write_work_nodes_edges(&sample_works()).unwrap();
        assert_eq!(summary, WriteSummary { nodes: 2, edges: 2 });

        let nodes = store.read_nodes().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0]["id"], "https://openalex.org/W1");
        assert_eq!(nodes[0]["title"], "First");
        assert_eq!(nodes[1]["references"], serde_json::json!([]));

        let edges = store.read_edges().unwrap();
        assert_eq!(
            edges,
            vec![
                ReferenceEdge::new("https://openalex.org/W1", "https://openalex.org/W7"),
                ReferenceEdge::new("https://openalex.org/W1", "https://openalex.org/W8"),
            ]
        );
    }

    #[test]
    fn test_double_write_doubles_records() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("works.jsonl"), dir.path().join("edges.csv"));

        store.write_work_nodes_edges(&sample_works()).unwrap();
        store.write_work_nodes_edges(&sample_works()).unwrap();

        assert_eq!(store.read_nodes().unwrap().len(), 4);
        assert_eq!(store.read_edges().unwrap().len(), 4);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("works.jsonl"), dir.path().join("edges.csv"));

        assert_eq!(store.write_work_nodes_edges(&[]).unwrap(), WriteSummary::default());
        assert!(!store.node_file().exists());
        assert!(!store.edge_file().exists());
    }

    #[test]
    fn test_corrupt_line_is_dropped() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("works.jsonl"), dir.path().join("edges.csv"));
        store.write_work_nodes_edges(&sample_works()).unwrap();

        let text = fs::read_to_string(store.node_file()).unwrap();
        let mut lines: Vec<&str> = text.lines().collect();
        lines[0] = "<<garbage>>";
        fs::write(store.node_file(), lines.join("\n")).unwrap();

        let nodes = store.read_nodes().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0]["id"], "https://openalex.org/W2");
    }
}
