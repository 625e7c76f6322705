use anyhow::{Context, Result};
use citegraph::config::{find_config_file, load_config, load_file, save_config, Config};
use citegraph::network::{harvest_topic, save_graph, GraphFormat, NetworkBuilder, DEFAULT_MAX_WORKS};
use citegraph::sources::{publication_year_filter, OpenAlexClient};
use citegraph::store::{read_edges, read_records, read_records_by_key};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// citegraph - Fetch OpenAlex topics and works and build their citation network
#[derive(Parser, Debug)]
#[command(name = "citegraph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch OpenAlex topics and works and build their citation network", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Contact email for the OpenAlex polite pool (overrides config)
    #[arg(long, global = true)]
    mailto: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up a single topic by id or URI
    Topic {
        /// Topic id (e.g. T10017) or full URI
        id: String,
    },

    /// Search topics by name
    #[command(alias = "s")]
    Search {
        /// Search query string
        query: String,

        /// Results per page
        #[arg(long, default_value_t = 25)]
        per_page: usize,

        /// Maximum number of pages to fetch
        #[arg(long, default_value_t = 1)]
        max_pages: usize,
    },

    /// Look up a single work by id or URI
    Work {
        /// Work id (e.g. W4249751050) or full URI
        id: String,
    },

    /// Stream a topic's works into the node and edge files
    Harvest {
        /// Topic id or URI
        topic: String,

        /// Stop after this many works
        #[arg(long, short)]
        max_results: Option<usize>,

        /// Results per page (defaults to the configured page size)
        #[arg(long)]
        per_page: Option<usize>,

        /// Earliest publication year (inclusive)
        #[arg(long)]
        year_from: Option<i32>,

        /// Latest publication year (inclusive)
        #[arg(long)]
        year_to: Option<i32>,

        /// Node file (JSON lines)
        #[arg(long)]
        nodes: Option<PathBuf>,

        /// Edge file (CSV)
        #[arg(long)]
        edges: Option<PathBuf>,
    },

    /// Build and export the citation network of a topic
    Build {
        /// Topic id, or a search query with --query
        topic: String,

        /// Treat TOPIC as a search query and use the first matching topic
        #[arg(long)]
        query: bool,

        /// Earliest publication year (inclusive)
        #[arg(long)]
        year_from: Option<i32>,

        /// Latest publication year (inclusive)
        #[arg(long)]
        year_to: Option<i32>,

        /// Maximum number of works to fetch
        #[arg(long, default_value_t = DEFAULT_MAX_WORKS)]
        max_works: usize,

        /// Graph output file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Graph format: json, graphml, gexf, gml
        #[arg(long, short)]
        format: Option<String>,

        /// Also append fetched works and edges to the node and edge files
        #[arg(long)]
        persist: bool,
    },

    /// Read back a node file (or an edge file with --edges)
    Read {
        /// File to read
        path: PathBuf,

        /// Extract the value under this top-level key
        #[arg(long)]
        key: Option<String>,

        /// Read the file as a CSV edge file
        #[arg(long, conflicts_with = "key")]
        edges: bool,

        /// Only print the record count
        #[arg(long)]
        count: bool,
    },

    /// Write a configuration file with default settings
    InitConfig {
        /// Destination (defaults to ./citegraph.toml)
        #[arg(long, default_value = "citegraph.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        /// Validate the file at --path and print its settings instead of writing
        #[arg(long, conflicts_with = "force")]
        check: bool,
    },
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| format!("citegraph={}", level)));
    let fmt_layer = if config.logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = load_config(config_path.as_deref())
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
    if let Some(mailto) = &cli.mailto {
        config.api.mailto = Some(mailto.clone());
    }

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    match cli.command {
        Commands::InitConfig { path, check: true, .. } => {
            let file_config =
                load_file(&path).with_context(|| format!("Invalid configuration file {}", path.display()))?;
            print_json(&file_config)?;
        }

        Commands::InitConfig { path, force, .. } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            save_config(&Config::default(), &path)?;
            println!("Wrote default configuration to {}", path.display());
        }

        Commands::Read {
            path,
            key,
            edges,
            count,
        } => {
            if edges {
                let edges = read_edges(&path)?;
                if count {
                    println!("{}", edges.len());
                } else {
                    print_json(&edges)?;
                }
            } else {
                let records = match key {
                    Some(key) => read_records_by_key(&path, &key)?,
                    None => read_records(&path)?,
                };
                if count {
                    println!("{}", records.len());
                } else {
                    print_json(&records)?;
                }
            }
        }

        Commands::Topic { id } => {
            let client = OpenAlexClient::new(config.client_options())?;
            print_json(&client.get_topic(&id).await?)?;
        }

        Commands::Search {
            query,
            per_page,
            max_pages,
        } => {
            let client = OpenAlexClient::new(config.client_options())?;
            let topics = client.search_topics(&query, per_page, max_pages).collect_all().await?;
            if topics.is_empty() {
                eprintln!("No topics found for '{}'", query);
            }
            print_json(&topics)?;
        }

        Commands::Work { id } => {
            let client = OpenAlexClient::new(config.client_options())?;
            print_json(&client.get_work(&id).await?)?;
        }

        Commands::Harvest {
            topic,
            max_results,
            per_page,
            year_from,
            year_to,
            nodes,
            edges,
        } => {
            if let Some(nodes) = nodes {
                config.output.node_file = nodes;
            }
            if let Some(edges) = edges {
                config.output.edge_file = edges;
            }
            let client = OpenAlexClient::new(config.client_options())?;
            let store = config.record_store();
            let filter = publication_year_filter(year_from, year_to);

            let summary = harvest_topic(
                &client,
                &store,
                &topic,
                per_page.unwrap_or(config.api.per_page),
                max_results,
                filter.as_deref(),
            )
            .await?;

            if !cli.quiet {
                println!(
                    "Harvested {} works ({} edges, {} skipped) over {} pages into {} and {}",
                    summary.works,
                    summary.edges,
                    summary.skipped,
                    summary.pages,
                    store.node_file().display(),
                    store.edge_file().display()
                );
            }
        }

        Commands::Build {
            topic,
            query,
            year_from,
            year_to,
            max_works,
            output,
            format,
            persist,
        } => {
            let format: GraphFormat = match format {
                Some(name) => name.parse()?,
                None => config.graph_format()?,
            };
            let output = output.unwrap_or_else(|| config.output.graph_file.clone());

            let client = OpenAlexClient::new(config.client_options())?;
            let store = config.record_store();
            let mut builder = NetworkBuilder::new(&client)
                .with_max_works(Some(max_works))
                .with_per_page(config.api.per_page);
            if persist {
                builder = builder.with_store(&store);
            }

            let graph = builder
                .build_network_for_topic(&topic, query, year_from, year_to)
                .await?;
            save_graph(&graph, &output, format)?;

            if !cli.quiet {
                println!(
                    "Citation network: {} nodes, {} edges -> {} ({})",
                    graph.node_count(),
                    graph.edge_count(),
                    output.display(),
                    format
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from(["citegraph", "-vv", "--mailto", "me@example.org", "work", "W1"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        assert_eq!(cli.mailto.as_deref(), Some("me@example.org"));

        let cli = Cli::parse_from(["citegraph", "topic", "T10017", "--quiet", "--config", "/tmp/c.toml"]);
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn test_cli_search_defaults() {
        let cli = Cli::parse_from(["citegraph", "s", "radiocarbon"]);
        match cli.command {
            Commands::Search {
                query,
                per_page,
                max_pages,
            } => {
                assert_eq!(query, "radiocarbon");
                assert_eq!(per_page, 25);
                assert_eq!(max_pages, 1);
            }
            other => panic!("Expected Search command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_build_command() {
        let cli = Cli::parse_from([
            "citegraph",
            "build",
            "climate variability",
            "--query",
            "--year-from",
            "2000",
            "--format",
            "graphml",
            "--persist",
        ]);
        match cli.command {
            Commands::Build {
                topic,
                query,
                year_from,
                year_to,
                max_works,
                format,
                persist,
                ..
            } => {
                assert_eq!(topic, "climate variability");
                assert!(query);
                assert_eq!(year_from, Some(2000));
                assert_eq!(year_to, None);
                assert_eq!(max_works, 1000);
                assert_eq!(format.as_deref(), Some("graphml"));
                assert!(persist);
            }
            other => panic!("Expected Build command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_harvest_command() {
        let cli = Cli::parse_from([
            "citegraph",
            "harvest",
            "T10017",
            "-m",
            "50",
            "--nodes",
            "out/works.jsonl",
        ]);
        match cli.command {
            Commands::Harvest {
                topic,
                max_results,
                nodes,
                edges,
                ..
            } => {
                assert_eq!(topic, "T10017");
                assert_eq!(max_results, Some(50));
                assert_eq!(nodes, Some(PathBuf::from("out/works.jsonl")));
                assert_eq!(edges, None);
            }
            other => panic!("Expected Harvest command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_read_edges_conflicts_with_key() {
        assert!(Cli::try_parse_from(["citegraph", "read", "f.json", "--key", "results", "--edges"]).is_err());
        let cli = Cli::parse_from(["citegraph", "read", "edges.csv", "--edges", "--count"]);
        assert!(matches!(cli.command, Commands::Read { edges: true, count: true, .. }));
    }

    #[test]
    fn test_cli_init_config_check() {
        let cli = Cli::parse_from(["citegraph", "init-config", "--path", "my.toml", "--check"]);
        match cli.command {
            Commands::InitConfig { path, check, force } => {
                assert_eq!(path, PathBuf::from("my.toml"));
                assert!(check);
                assert!(!force);
            }
            _ => panic!("Expected InitConfig command"),
        }
        assert!(Cli::try_parse_from(["citegraph", "init-config", "--check", "--force"]).is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["citegraph"]).is_err());
    }
}
