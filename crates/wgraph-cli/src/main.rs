//! wgraph CLI - inspect and edit a file-backed weighted graph.
//!
//! # Usage
//!
//! ```bash
//! # Add or overwrite an edge
//! wgraph connect home park 2.0
//!
//! # Bump an existing edge
//! wgraph increment home park 0.5
//!
//! # Cheapest route (or most expensive with --max)
//! wgraph path home shop
//!
//! # Use a specific store directory
//! wgraph --root ./graph-data list --prefix city:
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use wgraph_cli::commands::{self, Session};
use wgraph_cli::{OutputFormat, output};
use wgraph_core::GraphConfig;

#[derive(Parser)]
#[command(name = "wgraph")]
#[command(about = "Weighted graph store - edit vertices and query best paths", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Store directory (overrides config and WGRAPH_STORE_ROOT)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Output format (human, json)
    #[arg(long, global = true, default_value = "human")]
    format: OutputFormatArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or overwrite an edge
    Connect {
        /// Source vertex
        from: String,
        /// Target vertex
        to: String,
        /// Edge cost
        #[arg(allow_negative_numbers = true)]
        cost: f64,
    },

    /// Add a delta to an existing edge
    Increment {
        /// Source vertex
        from: String,
        /// Target vertex
        to: String,
        /// Amount added to the current cost
        #[arg(allow_negative_numbers = true)]
        delta: f64,
    },

    /// Remove an edge
    Disconnect {
        /// Source vertex
        from: String,
        /// Target vertex
        to: String,
    },

    /// Show the outgoing edges of a vertex
    Edges {
        /// Vertex label
        label: String,
    },

    /// List vertices
    List {
        /// Only labels starting with this prefix
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Find the best path between two vertices
    Path {
        /// Start vertex
        from: String,
        /// End vertex
        to: String,

        /// Maximize the accumulated cost instead of minimizing it
        #[arg(long)]
        max: bool,
    },

    /// Delete all vertices in the store
    Clear {
        /// Skip the safety check
        #[arg(short, long)]
        force: bool,
    },

    /// Show store statistics
    Stats,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::error(format!("{:#}", e));
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = GraphConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(root) = cli.root {
        config.store.root = root;
    }

    init_logging(cli.verbose, &config.general.log_level);

    let format = OutputFormat::from(cli.format);
    let session = Session::open(&config.store).await?;

    match cli.command {
        Commands::Connect { from, to, cost } => {
            commands::connect(&session, from, to, cost).await?;
        }
        Commands::Increment { from, to, delta } => {
            commands::increment(&session, from, to, delta).await?;
        }
        Commands::Disconnect { from, to } => {
            commands::disconnect(&session, from, to).await?;
        }
        Commands::Edges { label } => {
            commands::edges(&session, label, format).await?;
        }
        Commands::List { prefix } => {
            commands::list(&session, prefix, format).await?;
        }
        Commands::Path { from, to, max } => {
            commands::path(&session, from, to, max, format).await?;
        }
        Commands::Clear { force } => {
            commands::clear(&session, force).await?;
        }
        Commands::Stats => {
            commands::stats(&session, format).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = if verbose {
        EnvFilter::new("wgraph=debug,wgraph_core=debug,wgraph_storage=debug,wgraph_engine=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "wgraph_core={level},wgraph_storage={level},wgraph_engine={level},wgraph_cli={level},warn"
            ))
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
