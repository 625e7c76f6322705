//! In-memory citation graph with one node per work id.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::models::Work;

/// Node payload
///
/// Nodes created only because another work cites them carry no attributes
/// and have `fetched == false` until the work itself is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkNode {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip)]
    pub fetched: bool,
}

impl WorkNode {
    fn bare(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: None,
            year: None,
            doi: None,
            fetched: false,
        }
    }

    fn from_work(work: &Work) -> Self {
        Self {
            id: work.id.clone(),
            title: work.title.clone(),
            year: work.publication_year,
            doi: work.doi.clone(),
            fetched: true,
        }
    }
}

/// Directed graph, citing work → cited work
///
/// Node ids are unique; parallel edges are kept.
#[derive(Debug, Default, Clone)]
pub struct CitationGraph {
    graph: DiGraph<WorkNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl CitationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(WorkNode::bare(id));
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Add a fetched work and an edge for each of its references.
    ///
    /// The first fetched copy of a work sets its attributes; a node that so
    /// far existed only as a citation target is filled in.
    pub fn add_work(&mut self, work: &Work) {
        let idx = self.ensure_node(&work.id);
        if !self.graph[idx].fetched {
            self.graph[idx] = WorkNode::from_work(work);
        }
        for referenced in &work.references {
            self.add_reference(&work.id, referenced);
        }
    }

    /// Add a single citation, creating bare nodes as needed
    pub fn add_reference(&mut self, from_work: &str, referenced_work: &str) {
        let from = self.ensure_node(from_work);
        let to = self.ensure_node(referenced_work);
        self.graph.add_edge(from, to, ());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&WorkNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &WorkNode> + '_ {
        self.graph.node_weights()
    }

    /// `(citing, cited)` id pairs in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.graph.edge_references().map(move |edge| {
            (
                self.graph[edge.source()].id.as_str(),
                self.graph[edge.target()].id.as_str(),
            )
        })
    }

    /// Number of works in the graph citing `id`
    pub fn in_degree(&self, id: &str) -> usize {
        self.index.get(id).map_or(0, |&idx| {
            self.graph
                .neighbors_directed(idx, petgraph::Direction::Incoming)
                .count()
        })
    }
}
