use std::path::{Path, PathBuf};

use serde::Serialize;

use schemock_core::{EntitySet, validation_issues};

use crate::error::{IngestError, Result};
use crate::format::FormatId;

/// Outcome of validating one schema source.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub path: PathBuf,
    pub format: FormatId,
}

/// Trait implemented by every schema dialect parser.
///
/// Implementations are independent of each other; the registry only relies
/// on this contract and never on how a parser extracts entities.
pub trait SchemaParser: Send + Sync {
    /// Dialect handled by this parser.
    fn format(&self) -> FormatId;

    /// Lower-case file extensions, without the leading dot.
    fn supported_extensions(&self) -> &'static [&'static str];

    /// Convert schema text into the canonical entity model.
    fn parse_source(&self, source: &str) -> schemock_core::Result<EntitySet>;

    fn can_parse(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.supported_extensions()
                    .iter()
                    .any(|supported| supported.eq_ignore_ascii_case(ext))
            })
    }

    /// Read and parse `path`. Undecodable bytes are a parse failure, not I/O.
    fn parse_schema(&self, path: &Path) -> Result<EntitySet> {
        let bytes = std::fs::read(path)?;
        let source = String::from_utf8(bytes).map_err(|err| IngestError::SchemaParse {
            path: path.to_path_buf(),
            cause: format!("source is not valid UTF-8: {}", err.utf8_error()),
        })?;
        self.parse_source(&source)
            .map_err(|err| IngestError::SchemaParse {
                path: path.to_path_buf(),
                cause: err.to_string(),
            })
    }

    fn validate_schema(&self, path: &Path) -> SchemaValidation {
        let errors = match self.parse_schema(path) {
            Ok(entities) => validation_issues(&entities),
            Err(err) => vec![err.to_string()],
        };
        SchemaValidation {
            valid: errors.is_empty(),
            errors,
            path: path.to_path_buf(),
            format: self.format(),
        }
    }
}
