//! Command-line surface for the `narrator` binary.

mod cache;
mod catalog;
mod ingest;
mod setup;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use narrator::config::{Config, LogFormat, LoggingConfig};

/// Presentation narrator workspace tools.
#[derive(Parser, Debug)]
#[command(name = "narrator", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Project root containing data/, cache/ and config.yaml
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to <root>/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Inspect or clear the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Create the project directory layout, initial metadata, and config.yaml
    Setup,
    /// Scan presentations and write the metadata catalog
    Catalog,
    /// Check that presentations exist and contain extractable text
    Validate,
    /// Extract and chunk presentations into data/processed/chunks
    Ingest {
        /// Report chunk counts without writing chunk files
        #[arg(long)]
        dry_run: bool,
    },
}

/// Cache subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum CacheAction {
    /// Show file count, total size, and oldest/newest entry
    Stats,
    /// List cache entries
    List {
        /// Maximum number of entries to show
        #[arg(default_value_t = 10)]
        limit: usize,
    },
    /// Delete cache entries, optionally only those older than DAYS
    Clear {
        /// Only delete entries older than this many days
        days: Option<u64>,
    },
}

/// Parse arguments, load configuration, and dispatch.
pub(crate) async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Config::path_in(&cli.root));
    let config = Config::load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    init_logging(cli.verbose, &config.logging);

    let root = cli.root.as_path();
    match cli.command {
        Some(Commands::Cache { action }) => cache::cmd_cache(action, root, &config),
        Some(Commands::Setup) => setup::cmd_setup(root),
        Some(Commands::Catalog) => catalog::cmd_catalog(root, &config),
        Some(Commands::Validate) => catalog::cmd_validate(root, &config),
        Some(Commands::Ingest { dry_run }) => ingest::cmd_ingest(root, &config, dry_run).await,
        None => {
            cache::cmd_cache(CacheAction::Stats, root, &config)?;
            println!();
            println!("Usage:");
            println!("  narrator cache stats      - Show cache statistics");
            println!("  narrator cache list [N]   - List cache entries (default: 10)");
            println!("  narrator cache clear [N]  - Clear cache (or files older than N days)");
            println!("  narrator --help           - All commands");
            Ok(())
        }
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over config.
fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match logging.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Resolve a config-relative path against the project root.
pub(crate) fn resolve(root: &Path, path: &Path) -> PathBuf {
    Config::resolve(root, path)
}

pub(crate) const RULE_WIDTH: usize = 60;

pub(crate) fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}
