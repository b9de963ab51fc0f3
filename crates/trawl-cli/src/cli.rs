//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Trawl - search nested support bundles for incidents.
#[derive(Parser, Debug, Clone)]
#[command(name = "trawl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, global = true, env = "TRAWL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable text.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

impl Format {
    /// Picks JSON when `json` is set.
    #[must_use]
    pub const fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Table }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List every file inside a (nested) archive.
    Extract(ExtractArgs),

    /// Index one or more archives and search their text files.
    Search(SearchArgs),
}

/// Arguments for the extract command.
#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Archive to extract.
    pub archive: PathBuf,

    /// Print JSON instead of a listing.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the search command.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Archives to import, one root each.
    #[arg(required = true)]
    pub archives: Vec<PathBuf>,

    /// Text or regex to look for. May be empty when filters are given.
    #[arg(short, long, default_value = "")]
    pub query: String,

    /// Treat the query as a regular expression.
    #[arg(long)]
    pub regex: bool,

    /// Match case exactly.
    #[arg(long)]
    pub case_sensitive: bool,

    /// Context lines around each hit (0-8).
    #[arg(short = 'C', long)]
    pub context: Option<usize>,

    /// Maximum results (20-3000).
    #[arg(short, long)]
    pub max: Option<usize>,

    /// Only lines with this level.
    #[arg(long)]
    pub level: Option<String>,

    /// Only lines whose pod contains this.
    #[arg(long)]
    pub pod: Option<String>,

    /// Only lines whose container contains this.
    #[arg(long)]
    pub container: Option<String>,

    /// Only lines whose namespace contains this.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Earliest timestamp, RFC 3339.
    #[arg(long)]
    pub from: Option<String>,

    /// Latest timestamp, RFC 3339.
    #[arg(long)]
    pub to: Option<String>,

    /// Print JSON instead of a report.
    #[arg(long)]
    pub json: bool,
}
