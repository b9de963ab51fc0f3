//! # trawl-index
//!
//! Per-workspace log indexing and search over extracted bundle files.
//!
//! This crate provides:
//!
//! - [`MetadataExtractor`] - Timestamps, levels, correlation fields and anomaly tags per line
//! - [`WorkspaceIndex`] - Incremental, signature-aware file index
//! - [`QueryEngine`] - Text/regex search with filters, context, aggregation and timeline
//! - [`IndexWorker`] / [`IndexHandle`] - Dedicated indexing thread behind an async handle
//! - [`TrawlConfig`] - TOML configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use trawl_index::{DeltaFile, IndexDeltaRequest, IndexWorker, SearchRequest, TrawlConfig};
//!
//! # async fn demo() -> trawl_index::Result<()> {
//! let handle = IndexWorker::spawn(&TrawlConfig::default())?;
//!
//! let delta = IndexDeltaRequest::new("incident-42")
//!     .with_file(DeltaFile::new("k1", "v1", "root", "bundle.zip", "logs/app.log", "ERROR boom\n"))
//!     .with_total_files(1);
//! handle.apply_delta(delta).await?;
//!
//! let response = handle.search(SearchRequest::new(1, "incident-42", "boom")).await?;
//! println!("{} hits", response.results.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod index;
pub mod metadata;
pub mod protocol;
pub mod query;
pub mod types;
pub mod worker;

// Re-export main types
pub use config::{IndexConfig, SearchConfig, TrawlConfig, WorkerConfig};
pub use error::{IndexError, Result};
pub use index::{IndexStore, IndexedFile, WorkspaceIndex};
pub use metadata::MetadataExtractor;
pub use protocol::{DeltaFile, IndexDeltaRequest, IndexStatusResponse, SearchRequest};
pub use query::{QueryEngine, SearchAggregation, SearchResponse, SearchResult, TimelineEvent};
pub use types::{AnomalyTag, LineMetadata, LogLevel, SearchFilters, SearchOptions};
pub use worker::{IndexHandle, IndexWorker};
