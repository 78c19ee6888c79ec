use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::RelationKind;

/// A relation between two entities, proposed by inference.
///
/// Relations live beside the entity set rather than inside it so they can
/// be filtered by confidence without touching the parsed model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InferredRelation {
    pub from_entity: String,
    pub to_entity: String,
    pub via_field: String,
    pub kind: RelationKind,
    /// Heuristic strength in `[0, 1]`.
    pub confidence: f64,
    /// Mirrors `is_optional` of the field carrying the relation.
    pub optional: bool,
    /// Below the confidence threshold; kept for reporting, not graphed.
    #[serde(default)]
    pub informational: bool,
}

impl InferredRelation {
    pub fn is_self_reference(&self) -> bool {
        self.from_entity == self.to_entity
    }
}
