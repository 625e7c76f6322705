//! Directed citation edges derived from a work's reference list.

use serde::{Deserialize, Serialize};

use super::Work;

/// One citation relationship: `from_work` cites `referenced_work`.
///
/// Field order matches the CSV column order of the edge file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub from_work: String,
    pub referenced_work: String,
}

impl ReferenceEdge {
    pub fn new(from_work: impl Into<String>, referenced_work: impl Into<String>) -> Self {
        Self {
            from_work: from_work.into(),
            referenced_work: referenced_work.into(),
        }
    }
}

/// Derive one edge per reference, in reference order.
///
/// A work without references yields an empty list.
pub fn build_reference_edges(work: &Work) -> Vec<ReferenceEdge> {
    work.references
        .iter()
        .map(|referenced| ReferenceEdge::new(work.id.as_str(), referenced.as_str()))
        .collect()
}
