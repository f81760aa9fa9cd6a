//! Error types for mipscan.

use thiserror::Error;

/// Errors that can occur while loading collections, searching, or
/// persisting ground truth.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be opened, read, or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input does not match the expected layout (short record count,
    /// unparsable value, ground truth header mismatch).
    #[error("format error: {0}")]
    Format(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Query and data vectors disagree on dimensionality.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }
}

/// Result type for mipscan operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.bin");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("missing.bin"));
    }

    #[test]
    fn dimension_mismatch_message() {
        let err = Error::DimensionMismatch {
            expected: 128,
            actual: 64,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 128, got 64");
    }
}
