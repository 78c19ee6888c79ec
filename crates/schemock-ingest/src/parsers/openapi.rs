use serde_json::Value;

use schemock_core::{EntitySet, Error, Result};

use crate::format::FormatId;
use crate::parser::SchemaParser;

use super::shapes::entities_from_definitions;

/// Parser for OpenAPI 3 (`components.schemas`) and Swagger 2 (`definitions`)
/// documents, in YAML or JSON.
#[derive(Debug, Default)]
pub struct OpenApiParser;

impl SchemaParser for OpenApiParser {
    fn format(&self) -> FormatId {
        FormatId::OpenApi
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml", "json"]
    }

    fn parse_source(&self, source: &str) -> Result<EntitySet> {
        let document: Value = if source.trim_start().starts_with('{') {
            serde_json::from_str(source)
                .map_err(|err| Error::InvalidSchema(format!("invalid JSON: {err}")))?
        } else {
            serde_yaml_ng::from_str(source)
                .map_err(|err| Error::InvalidSchema(format!("invalid YAML: {err}")))?
        };

        if document.get("openapi").is_none() && document.get("swagger").is_none() {
            return Err(Error::InvalidSchema(
                "missing `openapi` or `swagger` version key".to_string(),
            ));
        }

        let schemas = document
            .pointer("/components/schemas")
            .or_else(|| document.get("definitions"))
            .and_then(Value::as_object)
            .ok_or_else(|| {
                Error::InvalidSchema("no components.schemas or definitions section".to_string())
            })?;

        entities_from_definitions(schemas)
    }
}
