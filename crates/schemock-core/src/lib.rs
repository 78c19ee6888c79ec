//! Core contracts for schemock.
//!
//! This crate defines the canonical entity model every schema parser emits,
//! structural validation, and the dependency graph and cycle analysis shared
//! by the resolver and the CLI.

pub mod constraints;
pub mod cycles;
pub mod error;
pub mod graph;
pub mod model;
pub mod relation;
pub mod types;
pub mod validation;

pub use constraints::{ForeignKeyLink, UniqueConstraint};
pub use cycles::{Cycle, CycleKind, CycleStrength, detect_cycles, select_primary_cycle};
pub use error::{Error, Result};
pub use graph::{DependencyEdge, DependencyGraph, DependencyNode, GraphSummary, build_graph};
pub use model::{Entity, EntitySet, Field};
pub use relation::InferredRelation;
pub use types::{FieldKind, RelationKind};
pub use validation::{validate_entity_set, validation_issues};

/// Current contract version for canonical entity-set documents.
pub const MODEL_VERSION: &str = "0.1";
