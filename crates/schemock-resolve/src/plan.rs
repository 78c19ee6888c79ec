use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use schemock_core::{Cycle, GraphSummary, InferredRelation};

use crate::errors::ResolutionWarning;

/// What happens to one relation field that closes a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BreakAction {
    /// Hard-removed; the field is generated empty.
    Break,
    /// Excluded from ordering and filled in a second pass.
    Defer,
    /// Generated empty first, populated after every entity exists.
    Lazy,
    /// Carries identifier references instead of nested values.
    Partial,
}

impl BreakAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BreakAction::Break => "break",
            BreakAction::Defer => "defer",
            BreakAction::Lazy => "lazy",
            BreakAction::Partial => "partial",
        }
    }
}

/// A field-level edge the plan takes out of ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BreakPoint {
    pub from_entity: String,
    pub to_entity: String,
    pub field: String,
    pub action: BreakAction,
}

/// A relation field to populate after first-pass generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeferredRelation {
    pub entity: String,
    pub field: String,
    pub target_entity: String,
}

/// Actions chosen by a strategy to linearize a cyclic graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolutionPlan {
    pub strategy: String,
    #[serde(default)]
    pub break_points: Vec<BreakPoint>,
    /// Filled in by the planner once every break point is known.
    #[serde(default)]
    pub generation_order: Vec<String>,
    #[serde(default)]
    pub deferred_relations: Vec<DeferredRelation>,
}

impl ResolutionPlan {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            break_points: Vec::new(),
            generation_order: Vec::new(),
            deferred_relations: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.break_points.is_empty()
    }

    /// Record a break point unless the same field edge is already planned.
    pub fn add_break_point(&mut self, point: BreakPoint) -> bool {
        let exists = self.break_points.iter().any(|existing| {
            existing.from_entity == point.from_entity
                && existing.to_entity == point.to_entity
                && existing.field == point.field
        });
        if !exists {
            self.break_points.push(point);
        }
        !exists
    }

    pub fn add_deferred(&mut self, relation: DeferredRelation) {
        if !self.deferred_relations.contains(&relation) {
            self.deferred_relations.push(relation);
        }
    }

    /// Fold a later pass into this plan, keeping first-seen order.
    pub fn merge(&mut self, other: ResolutionPlan) {
        for point in other.break_points {
            self.add_break_point(point);
        }
        for relation in other.deferred_relations {
            self.add_deferred(relation);
        }
    }
}

/// Everything a resolution produced for one entity set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolutionOutput {
    /// Dependencies-first entity order.
    pub generation_order: Vec<String>,
    /// Absent when the graph was already acyclic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_plan: Option<ResolutionPlan>,
    /// Cycles of the graph before any resolution.
    pub cycles: Vec<Cycle>,
    pub relations: Vec<InferredRelation>,
    pub summary: GraphSummary,
    #[serde(default)]
    pub warnings: Vec<ResolutionWarning>,
}

impl ResolutionOutput {
    pub fn is_acyclic(&self) -> bool {
        self.cycles.is_empty()
    }
}
