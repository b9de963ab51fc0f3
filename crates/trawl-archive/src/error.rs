//! Error types for archive decoding.

use thiserror::Error;

/// Errors that can occur while decoding a container.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Neither the file name nor the leading bytes identify a known container.
    #[error("unrecognized container format: {0}")]
    UnrecognizedFormat(String),

    /// The container ended before a header or data block was complete.
    #[error("truncated container at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Byte offset where the read started
        offset: usize,
        /// Bytes required to finish the read
        needed: usize,
        /// Bytes actually left in the buffer
        available: usize,
    },

    /// A tape-archive header could not be interpreted.
    #[error("invalid header at offset {offset}: {reason}")]
    InvalidHeader {
        /// Byte offset of the header block
        offset: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The ZIP codec rejected the container.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An I/O error occurred while inflating data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = ArchiveError::UnrecognizedFormat("notes.bin".to_string());
        assert_eq!(err.to_string(), "unrecognized container format: notes.bin");

        let err = ArchiveError::Truncated {
            offset: 512,
            needed: 512,
            available: 100,
        };
        assert_eq!(
            err.to_string(),
            "truncated container at offset 512: needed 512 bytes, 100 available"
        );

        let err = ArchiveError::InvalidHeader {
            offset: 0,
            reason: "bad size field".to_string(),
        };
        assert_eq!(err.to_string(), "invalid header at offset 0: bad size field");
    }

    #[test]
    fn error_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "corrupt deflate stream");
        let err: ArchiveError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ArchiveError>();
    }
}
