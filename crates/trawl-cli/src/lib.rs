//! # trawl-cli
//!
//! Trawl command-line interface.
//!
//! Provides commands for:
//! - Listing every file inside a nested support bundle
//! - Indexing bundles and searching their logs with filters and a timeline
//!
//! # Architecture
//!
//! The CLI is the collaborator that owns file I/O. It reads archives from
//! disk, flattens them with `trawl-archive`, and feeds the text files to a
//! `trawl-index` worker as one index delta.
//!
//! ```text
//! ┌──────────┐  bytes   ┌───────────────┐  delta/search  ┌─────────────┐
//! │  disk    │─────────►│ trawl-archive │───────────────►│ trawl-index │
//! └──────────┘          └───────────────┘                └─────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod import;
pub mod output;

pub use cli::{Cli, Commands, ExtractArgs, Format, SearchArgs};
pub use error::CliError;
pub use output::OutputFormat;
