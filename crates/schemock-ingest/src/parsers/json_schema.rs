use serde_json::{Map, Value};

use schemock_core::{EntitySet, Error, Result};

use crate::format::FormatId;
use crate::parser::SchemaParser;

use super::shapes::{entities_from_definitions, is_object_schema};

/// Parser for JSON Schema documents.
///
/// Entities come from `definitions` / `$defs`; a titled root object schema
/// is an entity of its own.
#[derive(Debug, Default)]
pub struct JsonSchemaParser;

impl SchemaParser for JsonSchemaParser {
    fn format(&self) -> FormatId {
        FormatId::JsonSchema
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn parse_source(&self, source: &str) -> Result<EntitySet> {
        let document: Value = serde_json::from_str(source)
            .map_err(|err| Error::InvalidSchema(format!("invalid JSON: {err}")))?;

        let mut definitions = Map::new();
        for key in ["definitions", "$defs"] {
            if let Some(found) = document.get(key).and_then(Value::as_object) {
                definitions.extend(found.iter().map(|(name, schema)| (name.clone(), schema.clone())));
            }
        }

        if let Some(title) = document.get("title").and_then(Value::as_str) {
            if is_object_schema(&document) && !definitions.contains_key(title) {
                definitions.insert(title.to_string(), document.clone());
            }
        }

        if definitions.is_empty() {
            return Err(Error::InvalidSchema(
                "no definitions, $defs or titled root object found".to_string(),
            ));
        }

        entities_from_definitions(&definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titled_root_and_defs_become_entities() {
        let source = r##"{
          "$schema": "https://json-schema.org/draft/2020-12/schema",
          "title": "Order",
          "type": "object",
          "required": ["customer"],
          "properties": {
            "id": { "type": "integer" },
            "customer": { "$ref": "#/$defs/Customer" },
            "customerId": { "type": "integer", "x-foreign-key": "Customer.id" }
          },
          "$defs": {
            "Customer": {
              "type": "object",
              "properties": { "id": { "type": "integer" } }
            }
          }
        }"##;

        let set = JsonSchemaParser.parse_source(source).unwrap();
        assert_eq!(set.len(), 2);
        let order = set.get("Order").unwrap();
        assert!(order.field("customer").unwrap().is_relation());
        let link = order.field("customerId").unwrap().foreign_key.clone().unwrap();
        assert_eq!(link.target_entity.as_deref(), Some("Customer"));
        assert_eq!(link.references, vec!["id".to_string()]);
    }

    #[test]
    fn rejects_documents_without_objects() {
        let err = JsonSchemaParser.parse_source(r#"{"type": "string"}"#).unwrap_err();
        assert!(err.to_string().contains("no definitions"));
    }
}
