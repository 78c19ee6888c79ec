use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while detecting, dispatching or parsing schema sources.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Nothing recognised the source and no format was given.
    #[error("could not detect schema format for {}", path.display())]
    FormatDetectionFailed { path: PathBuf },
    /// The format is unknown or has no registered parser.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// The parser rejected the source.
    #[error("failed to parse {}: {cause}", path.display())]
    SchemaParse { path: PathBuf, cause: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Core(#[from] schemock_core::Error),
}

impl IngestError {
    /// Detection failures can be retried with an explicit format.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IngestError::FormatDetectionFailed { .. })
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
