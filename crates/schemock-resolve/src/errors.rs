use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the resolver.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The requested strategy was never registered.
    #[error("unknown resolution strategy: {0}")]
    UnknownStrategy(String),
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Non-fatal conditions reported alongside a resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionWarning {
    /// The entity could not be ordered and was appended at the end.
    UnplacedEntity { entity: String },
    /// Relations scored below the threshold were kept as informational only.
    RelationsBelowThreshold { count: usize, threshold: f64 },
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionWarning::UnplacedEntity { entity } => {
                write!(f, "entity '{entity}' could not be placed and was appended")
            }
            ResolutionWarning::RelationsBelowThreshold { count, threshold } => write!(
                f,
                "{count} relation(s) below confidence {threshold} excluded from the graph"
            ),
        }
    }
}
