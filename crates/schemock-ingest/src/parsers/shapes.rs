//! Conversion of JSON-Schema-shaped object definitions into entities.
//!
//! Shared by the JSON Schema and OpenAPI parsers, which differ only in
//! where the definitions live.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use schemock_core::{Entity, EntitySet, Error, Field, ForeignKeyLink, Result};

const CONSTRAINT_KEYS: &[&str] = &[
    "format",
    "minLength",
    "maxLength",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "pattern",
    "minItems",
    "maxItems",
];

/// Build an entity set from a map of named definitions.
///
/// Object definitions become entities; every other definition is an alias
/// whose scalar type is substituted wherever it is referenced.
pub fn entities_from_definitions(definitions: &Map<String, Value>) -> Result<EntitySet> {
    let objects: BTreeSet<&str> = definitions
        .iter()
        .filter(|(_, schema)| is_object_schema(schema))
        .map(|(name, _)| name.as_str())
        .collect();

    let aliases: BTreeMap<&str, String> = definitions
        .iter()
        .filter(|(name, _)| !objects.contains(name.as_str()))
        .map(|(name, schema)| (name.as_str(), scalar_type_name(schema)))
        .collect();

    let mut set = EntitySet::new();
    for (name, schema) in definitions {
        if objects.contains(name.as_str()) {
            set.insert(entity_from_object(name, schema, &objects, &aliases)?)?;
        }
    }
    Ok(set)
}

pub fn is_object_schema(schema: &Value) -> bool {
    schema.get("properties").is_some_and(Value::is_object)
        || (schema.get("type").and_then(Value::as_str) == Some("object")
            && schema.get("additionalProperties").is_none())
}

fn entity_from_object(
    name: &str,
    schema: &Value,
    objects: &BTreeSet<&str>,
    aliases: &BTreeMap<&str, String>,
) -> Result<Entity> {
    let required: BTreeSet<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut entity = Entity::new(name);
    let Some(properties) = schema.get("properties") else {
        return Ok(entity);
    };
    let properties = properties.as_object().ok_or_else(|| {
        Error::InvalidSchema(format!("properties of '{name}' must be an object"))
    })?;

    for (property, property_schema) in properties {
        let field = field_from_property(
            property,
            property_schema,
            required.contains(property.as_str()),
            objects,
            aliases,
        );
        entity.fields.push(field);
    }

    Ok(entity)
}

fn field_from_property(
    name: &str,
    schema: &Value,
    required: bool,
    objects: &BTreeSet<&str>,
    aliases: &BTreeMap<&str, String>,
) -> Field {
    let raw_type = serde_json::to_string(schema).unwrap_or_default();
    let (shape, nullable) = unwrap_nullable(schema);

    let (element, is_array) = match shape.get("type").and_then(Value::as_str) {
        Some("array") => (shape.get("items").unwrap_or(&Value::Null), true),
        _ => (shape, false),
    };
    let (element, element_nullable) = unwrap_nullable(element);

    let mut field = match reference_name(element) {
        Some(target) if objects.contains(target) => Field::relation(name, target),
        Some(target) => Field::scalar(
            name,
            aliases
                .get(target)
                .cloned()
                .unwrap_or_else(|| target.to_string()),
        ),
        None => Field::scalar(name, scalar_type_name(element)),
    };
    field = field.raw(raw_type);
    field.is_array = is_array;
    field.is_optional = !required || nullable || (!is_array && element_nullable);
    field.is_identifier = matches!(name, "id" | "_id")
        || shape.get("x-identifier").and_then(Value::as_bool) == Some(true);
    field.is_unique = field.is_identifier
        || shape.get("x-unique").and_then(Value::as_bool) == Some(true);
    field.has_default = shape.get("default").is_some();

    if let Some(target) = shape.get("x-foreign-key").and_then(Value::as_str) {
        let (entity, reference) = match target.split_once('.') {
            Some((entity, reference)) => (entity, Some(reference)),
            None => (target, None),
        };
        field.foreign_key = Some(ForeignKeyLink {
            target_entity: Some(entity.to_string()),
            fields: vec![name.to_string()],
            references: reference.map(str::to_string).into_iter().collect(),
            relation_name: None,
        });
    }

    for key in CONSTRAINT_KEYS {
        if let Some(value) = element.get(*key) {
            field.constraints.insert((*key).to_string(), constraint_text(value));
        }
    }
    if let Some(values) = element.get("enum").and_then(Value::as_array) {
        let joined = values.iter().map(constraint_text).collect::<Vec<_>>().join("|");
        field.constraints.insert("enum".to_string(), joined);
    }

    field
}

/// Strip `nullable`, `type: [.., "null"]` and single-entry `allOf`/`anyOf`/`oneOf`
/// wrappers, reporting whether null was allowed.
fn unwrap_nullable(schema: &Value) -> (&Value, bool) {
    let mut nullable = schema.get("nullable").and_then(Value::as_bool) == Some(true);

    if let Some(types) = schema.get("type").and_then(Value::as_array) {
        nullable |= types.iter().any(|item| item.as_str() == Some("null"));
    }

    for key in ["allOf", "anyOf", "oneOf"] {
        let Some(variants) = schema.get(key).and_then(Value::as_array) else {
            continue;
        };
        let mut concrete = variants.iter().filter(|variant| !is_null_schema(variant));
        nullable |= variants.iter().any(is_null_schema);
        if let (Some(only), None) = (concrete.next(), concrete.next()) {
            let (inner, inner_nullable) = unwrap_nullable(only);
            return (inner, nullable || inner_nullable);
        }
    }

    (schema, nullable)
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
}

fn reference_name(schema: &Value) -> Option<&str> {
    schema
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|reference| reference.rsplit('/').next())
        .filter(|name| !name.is_empty())
}

fn scalar_type_name(schema: &Value) -> String {
    match schema.get("type") {
        Some(Value::String(name)) => name.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|name| *name != "null")
            .unwrap_or("null")
            .to_string(),
        _ if schema.get("enum").is_some() => "string".to_string(),
        _ => "object".to_string(),
    }
}

fn constraint_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
