use schemock_core::{Cycle, DependencyGraph};

use super::{ResolutionStrategy, mark_pair};
use crate::plan::{BreakAction, ResolutionPlan};

/// Replaces nested values with identifier references, so cycle edges never
/// constrain ordering and no second pass is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialReferences;

impl ResolutionStrategy for PartialReferences {
    fn name(&self) -> &str {
        "partial-references"
    }

    fn resolve(&self, cycle: &Cycle, graph: &DependencyGraph) -> ResolutionPlan {
        let mut plan = ResolutionPlan::new(self.name());
        for (from, to) in cycle.edges() {
            mark_pair(&mut plan, graph, from, to, BreakAction::Partial, false);
        }
        plan
    }
}
