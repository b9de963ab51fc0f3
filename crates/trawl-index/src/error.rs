//! Error types for indexing and search.

use thiserror::Error;

/// Errors that can occur while indexing or searching.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The search query could not be compiled as a regular expression.
    #[error("invalid regex: {0}")]
    InvalidRegex(String),

    /// The index worker has stopped and no longer accepts requests.
    #[error("index worker closed")]
    WorkerClosed,

    /// No index exists for the given workspace.
    #[error("unknown workspace: {0}")]
    UnknownWorkspace(String),

    /// Configuration was invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
