//! # trawl-archive
//!
//! Recursive decoding of nested support bundles.
//!
//! This crate provides:
//!
//! - [`extract`] - Flattens an arbitrarily nested bundle into [`ExtractedFile`] leaves
//! - [`container::decode`] - Immediate entries of one ZIP, GZIP or tar container
//! - [`tar`] - Tape-archive decoding with GNU long names and PAX paths
//! - [`is_text_like`] - Decides whether a blob is searchable text
//!
//! ## Example
//!
//! ```rust,no_run
//! use trawl_archive::extract;
//!
//! let bytes = std::fs::read("support-bundle.zip").unwrap_or_default();
//! if let Ok(files) = extract("support-bundle.zip", bytes) {
//!     for file in files.iter().filter(|f| f.text_like) {
//!         println!("{} ({} bytes)", file.path, file.size);
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
pub mod container;
pub mod error;
pub mod extract;
pub mod path;
pub mod tar;
pub mod types;

// Re-export main types
pub use classify::is_text_like;
pub use container::ContainerFormat;
pub use error::{ArchiveError, Result};
pub use extract::{MAX_DEPTH, extract};
pub use types::{ContainerEntry, EntryKind, ExtractedFile};
