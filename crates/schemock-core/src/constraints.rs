use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Foreign-key linkage declared on a field.
///
/// `fields` are the local source fields, `references` the fields on the
/// target entity. Relation-typed fields (Prisma `@relation`) carry the link
/// on the relation field itself; column dialects (SQL) carry it on the
/// scalar column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyLink {
    /// Entity the link points at, when the source names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_entity: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    /// Relation label (`@relation("AuthoredPosts")`, constraint name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_name: Option<String>,
}

impl ForeignKeyLink {
    pub fn to_entity(target: impl Into<String>) -> Self {
        Self {
            target_entity: Some(target.into()),
            ..Self::default()
        }
    }
}

/// Multi-field uniqueness constraint, preserving field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UniqueConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: Vec<String>,
}

impl UniqueConstraint {
    pub fn new(fields: Vec<String>) -> Self {
        Self { name: None, fields }
    }
}
