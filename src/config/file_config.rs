//! Configuration file support for citegraph.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "https://api.openalex.org"
//! mailto = "you@example.org"
//! pagination = "cursor"      # or "page"
//! per_page = 200
//! request_timeout_secs = 30
//! page_delay_ms = 500
//! rate_limit_backoff_ms = 1000
//!
//! [output]
//! node_file = "works.jsonl"
//! edge_file = "reference_edges.csv"
//! graph_file = "citation_network.json"
//! graph_format = "json"      # json, graphml, gexf, gml
//!
//! [logging]
//! level = "info"
//! format = "text"            # or "json"
//! ```

use std::path::Path;

use super::Config;

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Read a TOML file on its own, without environment overrides
pub fn load_file(path: &Path) -> Result<Config, ConfigFileError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
}

/// Write `config` as pretty TOML, creating the parent directory if needed
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigFileError> {
    let content = toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }
    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}
