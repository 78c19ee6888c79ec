use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{ForeignKeyLink, UniqueConstraint};
use crate::error::{Error, Result};
use crate::types::FieldKind;

/// One typed, named attribute of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    /// Field name, unique within its entity.
    pub name: String,
    /// Declared type. For list fields this is the element type.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Type text exactly as written in the source schema.
    #[serde(default)]
    pub raw_type: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub is_identifier: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub has_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyLink>,
    /// Free-form constraints carried over from the source (`maxLength`, `format`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<String, String>,
}

impl Field {
    fn with_kind(name: impl Into<String>, field_type: impl Into<String>, kind: FieldKind) -> Self {
        let field_type = field_type.into();
        Self {
            name: name.into(),
            raw_type: field_type.clone(),
            field_type,
            kind,
            is_array: false,
            is_optional: false,
            is_identifier: false,
            is_unique: false,
            has_default: false,
            foreign_key: None,
            constraints: BTreeMap::new(),
        }
    }

    pub fn scalar(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self::with_kind(name, field_type, FieldKind::Scalar)
    }

    pub fn relation(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self::with_kind(name, field_type, FieldKind::Relation)
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn identifier(mut self) -> Self {
        self.is_identifier = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn defaulted(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn raw(mut self, raw_type: impl Into<String>) -> Self {
        self.raw_type = raw_type.into();
        self
    }

    pub fn with_foreign_key(mut self, link: ForeignKeyLink) -> Self {
        self.foreign_key = Some(link);
        self
    }

    pub fn with_constraint(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.constraints.insert(key.into(), value.into());
        self
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == FieldKind::Scalar
    }

    pub fn is_relation(&self) -> bool {
        self.kind == FieldKind::Relation
    }
}

/// One schema-defined record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Entity {
    pub name: String,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_constraints: Vec<UniqueConstraint>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_unique(mut self, constraint: UniqueConstraint) -> Self {
        self.unique_constraints.push(constraint);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn identifier_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.is_identifier)
    }
}

/// Entities keyed by name, iterated in name order.
///
/// Deserialization rejects entities stored under a key other than their name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "EntityMap")]
pub struct EntitySet {
    entities: BTreeMap<String, Entity>,
}

/// Wire form of [`EntitySet`] before key checks.
#[derive(Deserialize, JsonSchema)]
struct EntityMap {
    entities: BTreeMap<String, Entity>,
}

impl TryFrom<EntityMap> for EntitySet {
    type Error = Error;

    fn try_from(map: EntityMap) -> Result<Self> {
        if let Some((key, entity)) = map
            .entities
            .iter()
            .find(|(key, entity)| **key != entity.name)
        {
            return Err(Error::InvalidSchema(format!(
                "entity '{}' stored under mismatched key '{key}'",
                entity.name
            )));
        }
        Ok(Self {
            entities: map.entities,
        })
    }
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from entities, rejecting duplicate names.
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Result<Self> {
        let mut set = Self::new();
        for entity in entities {
            set.insert(entity)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, entity: Entity) -> Result<()> {
        if self.entities.contains_key(&entity.name) {
            return Err(Error::InvalidSchema(format!(
                "duplicate entity name: {}",
                entity.name
            )));
        }
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Resolve a name to the stored entity name, falling back to a
    /// case-insensitive match.
    pub fn resolve_name(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.entities.get_key_value(name) {
            return Some(key.as_str());
        }
        self.entities
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entities with the key they are stored under.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entity)> {
        self.entities.iter().map(|(key, entity)| (key.as_str(), entity))
    }

    pub fn into_entities(self) -> impl Iterator<Item = Entity> {
        self.entities.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_and_relation_are_exclusive() {
        let scalar = Field::scalar("email", "String");
        assert!(scalar.is_scalar());
        assert!(!scalar.is_relation());

        let relation = Field::relation("author", "User");
        assert!(relation.is_relation());
        assert!(!relation.is_scalar());
    }

    #[test]
    fn duplicate_entities_are_rejected() {
        let result = EntitySet::from_entities([Entity::new("User"), Entity::new("User")]);
        assert!(matches!(result, Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn resolve_name_falls_back_to_case_insensitive() {
        let set = EntitySet::from_entities([Entity::new("OrderItem")]).expect("entity set");
        assert_eq!(set.resolve_name("OrderItem"), Some("OrderItem"));
        assert_eq!(set.resolve_name("orderitem"), Some("OrderItem"));
        assert_eq!(set.resolve_name("order"), None);
    }
}
