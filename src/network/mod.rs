//! Citation network construction and export.
//!
//! [`NetworkBuilder`] streams the works of a topic into a [`CitationGraph`]
//! (one node per work id, one edge per citation, parallel edges kept) and
//! [`save_graph`] writes it out as node-link JSON, GraphML, GEXF or GML.
//! [`harvest_topic`] runs the same walk without building a graph, persisting
//! each page to a [`crate::store::RecordStore`].
//!
//! ```rust,no_run
//! use citegraph::network::{save_graph, GraphFormat, NetworkBuilder};
//! use citegraph::sources::OpenAlexClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAlexClient::new(Default::default())?;
//! let graph = NetworkBuilder::new(&client)
//!     .with_max_works(Some(500))
//!     .build_network_for_topic("radiocarbon dating", true, Some(2000), None)
//!     .await?;
//! save_graph(&graph, "network.graphml".as_ref(), GraphFormat::GraphMl)?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod export;
mod graph;
mod harvest;

pub use builder::{NetworkBuilder, DEFAULT_MAX_WORKS, DEFAULT_PER_PAGE};
pub use export::{export_graph, save_graph, ExportError, GraphFormat};
pub use graph::{CitationGraph, WorkNode};
pub use harvest::{harvest_topic, HarvestSummary};

use thiserror::Error;

use crate::sources::SourceError;
use crate::store::StoreError;

/// Errors from a build or harvest run
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}
