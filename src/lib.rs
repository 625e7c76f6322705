//! # citegraph
//!
//! Fetches topic and work records from the OpenAlex API and turns them into a
//! citation graph: works are nodes, references are directed citing → cited
//! edges.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Topic, Work, ReferenceEdge)
//! - [`sources`]: OpenAlex client, pagination, record normalization
//! - [`store`]: Append-only JSON-lines node file and CSV edge file, with a
//!   tolerant reader
//! - [`network`]: Citation graph builder, harvest pipeline and graph export
//! - [`utils`]: HTTP transport and rate-limit retry
//! - [`config`]: Configuration management

pub mod config;
pub mod models;
pub mod network;
pub mod sources;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use models::{build_reference_edges, ReferenceEdge, Topic, Work};
pub use network::{CitationGraph, NetworkBuilder};
pub use sources::{OpenAlexClient, SourceError, Transport};
pub use store::RecordStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
