//! Core types for archive decoding.
//!
//! This module provides:
//! - [`EntryKind`] - Whether a container entry is a file or a directory
//! - [`ContainerEntry`] - One immediate entry of a decoded container
//! - [`ExtractedFile`] - A leaf produced by recursive extraction

use bytes::Bytes;
use serde::Serialize;

/// Kind of a container entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file with content
    File,
    /// Directory, structural only
    Dir,
}

/// An immediate entry of one decoded container.
///
/// Entries only live for the duration of a decode/extract pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    /// Normalized, `/`-joined path inside the container
    pub path: String,
    /// File or directory
    pub kind: EntryKind,
    /// Entry content (empty for directories)
    pub bytes: Bytes,
}

impl ContainerEntry {
    /// Creates a file entry.
    #[must_use]
    pub fn file(path: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            bytes: bytes.into(),
        }
    }

    /// Creates a directory entry.
    #[must_use]
    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Dir,
            bytes: Bytes::new(),
        }
    }
}

/// A leaf file produced by recursive extraction.
///
/// `path` is the full virtual path through every nesting layer, with each
/// container's archive extension stripped, e.g. `bundle/node-1/logs/app.log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFile {
    /// Virtual path, never containing `.` or `..` segments
    pub path: String,
    /// Content length in bytes
    pub size: usize,
    /// File content
    #[serde(skip)]
    pub bytes: Bytes,
    /// Whether the content should be treated as searchable text
    pub text_like: bool,
}

impl ExtractedFile {
    /// Returns the content decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
