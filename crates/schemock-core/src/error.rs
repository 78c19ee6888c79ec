use thiserror::Error;

/// Core error type shared across schemock crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The entity set violates structural invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by schemock crates.
pub type Result<T> = std::result::Result<T, Error>;
