use jsonschema::JSONSchema;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use schemock_core::{Entity, EntitySet, Error, MODEL_VERSION, Result};

use crate::format::FormatId;
use crate::parser::SchemaParser;

/// On-disk form of an entity set already in the canonical model.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalDocument {
    /// Contract version of the document.
    pub version: String,
    pub entities: Vec<Entity>,
}

impl CanonicalDocument {
    pub fn from_entity_set(entities: &EntitySet) -> Self {
        Self {
            version: MODEL_VERSION.to_string(),
            entities: entities.iter().cloned().collect(),
        }
    }
}

/// Parser for canonical JSON documents.
///
/// Documents are checked against the JSON Schema generated from the model
/// before deserialisation so errors point at the offending location.
#[derive(Debug, Default)]
pub struct CanonicalParser;

impl SchemaParser for CanonicalParser {
    fn format(&self) -> FormatId {
        FormatId::Canonical
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn parse_source(&self, source: &str) -> Result<EntitySet> {
        let document: Value = serde_json::from_str(source)
            .map_err(|err| Error::InvalidSchema(format!("invalid JSON: {err}")))?;

        let schema = serde_json::to_value(schema_for!(CanonicalDocument))
            .map_err(|err| Error::Other(err.to_string()))?;
        let compiled =
            JSONSchema::compile(&schema).map_err(|err| Error::Other(err.to_string()))?;

        if let Err(errors) = compiled.validate(&document) {
            let messages: Vec<String> = errors
                .map(|error| {
                    let path = error.instance_path.to_string();
                    let path = if path.is_empty() { "/".to_string() } else { path };
                    format!("{path}: {error}")
                })
                .collect();
            return Err(Error::InvalidSchema(messages.join("; ")));
        }

        let document: CanonicalDocument = serde_json::from_value(document)
            .map_err(|err| Error::InvalidSchema(err.to_string()))?;
        EntitySet::from_entities(document.entities)
    }
}
