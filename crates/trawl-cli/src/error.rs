//! CLI error types.

use thiserror::Error;
use trawl_archive::ArchiveError;
use trawl_index::IndexError;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// An archive could not be decoded.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Indexing or search failed.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_argument() {
        let err = CliError::InvalidArgument("--from: bad".into());
        assert_eq!(err.to_string(), "invalid argument: --from: bad");
    }

    #[test]
    fn from_index_error() {
        let err = CliError::from(IndexError::WorkerClosed);
        assert!(matches!(err, CliError::Index(_)));
        assert_eq!(err.to_string(), "index error: index worker closed");
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        assert!(matches!(CliError::from(io_err), CliError::Io(_)));
    }
}
