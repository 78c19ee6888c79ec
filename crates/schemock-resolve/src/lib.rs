//! Relation inference, cycle resolution and generation ordering.

pub mod errors;
pub mod inference;
pub mod options;
pub mod plan;
pub mod planner;
pub mod resolver;
pub mod schema;
pub mod strategy;

pub use errors::{ResolutionWarning, ResolveError, Result};
pub use inference::infer_relations;
pub use options::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_PASSES, DEFAULT_STRATEGY, InferenceOptions,
    ResolveOptions,
};
pub use plan::{BreakAction, BreakPoint, DeferredRelation, ResolutionOutput, ResolutionPlan};
pub use planner::{PlacedOrder, apply_plan};
pub use resolver::DependencyResolver;
pub use schema::resolution_output_json_schema;
pub use strategy::{
    FnStrategy, LazyLoading, PartialReferences, ResolutionStrategy, SmartBreak, StrategyRegistry,
};
