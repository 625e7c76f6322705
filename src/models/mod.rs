//! Core data models for topics, works and citation edges.

mod edge;
mod topic;
mod work;

pub use edge::{build_reference_edges, ReferenceEdge};
pub use topic::Topic;
pub use work::{Work, WorkBuilder};
