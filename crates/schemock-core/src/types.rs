use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Whether a field holds a plain value or points at another entity.
///
/// A field is exactly one of the two, which is why this is an enum rather
/// than a pair of flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Scalar,
    Relation,
}

/// How a relation between two entities was established.
///
/// Variants are listed in inference priority order; `Ord` follows it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    /// The field's declared type is a known entity.
    Direct,
    /// An explicit foreign-key or relation annotation names the target.
    Annotation,
    /// Field name follows a foreign-key pattern such as `userId`.
    FkPattern,
    /// Field name is a collection form of an entity name such as `posts`.
    NamingConvention,
    /// Weak shape-based guess.
    Inferred,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Direct => "direct",
            RelationKind::Annotation => "annotation",
            RelationKind::FkPattern => "fk-pattern",
            RelationKind::NamingConvention => "naming-convention",
            RelationKind::Inferred => "inferred",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
