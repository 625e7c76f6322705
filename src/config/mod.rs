//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `CITEGRAPH_*` environment variables (`CITEGRAPH_API__MAILTO`,
//! `CITEGRAPH_OUTPUT__NODE_FILE`, ...).

pub mod file_config;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::network::{ExportError, GraphFormat};
use crate::sources::{ClientOptions, PaginationStyle};
use crate::store::RecordStore;
use crate::utils::OPENALEX_API_BASE;

pub use file_config::{load_file, save_config, ConfigFileError};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Contact address for the polite pool
    #[serde(default)]
    pub mailto: Option<String>,

    #[serde(default)]
    pub pagination: PaginationStyle,

    #[serde(default = "default_per_page")]
    pub per_page: usize,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Idle delay between page requests
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,

    /// Wait before retrying a rate-limited request
    #[serde(default = "default_backoff")]
    pub rate_limit_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mailto: None,
            pagination: PaginationStyle::default(),
            per_page: default_per_page(),
            request_timeout_secs: default_timeout(),
            page_delay_ms: default_page_delay(),
            rate_limit_backoff_ms: default_backoff(),
        }
    }
}

fn default_base_url() -> String {
    OPENALEX_API_BASE.to_string()
}

fn default_per_page() -> usize {
    200
}

fn default_timeout() -> u64 {
    30
}

fn default_page_delay() -> u64 {
    500
}

fn default_backoff() -> u64 {
    1000
}

/// Output file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_node_file")]
    pub node_file: PathBuf,

    #[serde(default = "default_edge_file")]
    pub edge_file: PathBuf,

    #[serde(default = "default_graph_file")]
    pub graph_file: PathBuf,

    /// `json`, `graphml`, `gexf` or `gml`
    #[serde(default = "default_graph_format")]
    pub graph_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            node_file: default_node_file(),
            edge_file: default_edge_file(),
            graph_file: default_graph_file(),
            graph_format: default_graph_format(),
        }
    }
}

fn default_node_file() -> PathBuf {
    PathBuf::from("works.jsonl")
}

fn default_edge_file() -> PathBuf {
    PathBuf::from("reference_edges.csv")
}

fn default_graph_file() -> PathBuf {
    PathBuf::from("citation_network.json")
}

fn default_graph_format() -> String {
    "json".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Client settings derived from the `api` section
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api.base_url.clone(),
            mailto: self.api.mailto.clone(),
            pagination: self.api.pagination,
            request_timeout: Duration::from_secs(self.api.request_timeout_secs),
            page_delay: Duration::from_millis(self.api.page_delay_ms),
            rate_limit_backoff: Duration::from_millis(self.api.rate_limit_backoff_ms),
        }
    }

    /// Store over the configured node and edge files
    pub fn record_store(&self) -> RecordStore {
        RecordStore::new(&self.output.node_file, &self.output.edge_file)
    }

    pub fn graph_format(&self) -> Result<GraphFormat, ExportError> {
        self.output.graph_format.parse()
    }
}

/// Load configuration from defaults, an optional TOML file and the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix("CITEGRAPH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// First existing config file: `./citegraph.toml`, then
/// `<config dir>/citegraph/config.toml`
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("citegraph.toml");
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("citegraph").join("config.toml"))
        .filter(|path| path.is_file())
}
