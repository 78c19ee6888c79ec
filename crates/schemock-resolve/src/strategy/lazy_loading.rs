use schemock_core::{Cycle, DependencyGraph};

use super::{ResolutionStrategy, mark_pair};
use crate::plan::{BreakAction, ResolutionPlan};

/// Generates every entity on the cycle with empty relation fields, then
/// populates them in a second pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct LazyLoading;

impl ResolutionStrategy for LazyLoading {
    fn name(&self) -> &str {
        "lazy-loading"
    }

    fn resolve(&self, cycle: &Cycle, graph: &DependencyGraph) -> ResolutionPlan {
        let mut plan = ResolutionPlan::new(self.name());
        for (from, to) in cycle.edges() {
            mark_pair(&mut plan, graph, from, to, BreakAction::Lazy, true);
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{first_cycle, graph};

    #[test]
    fn every_cycle_edge_is_lazy_and_deferred() {
        let graph = graph(
            &["A", "B", "C"],
            &[("A", "B", "b", false), ("B", "C", "c", true), ("C", "A", "a", false)],
        );
        let plan = LazyLoading.resolve(&first_cycle(&graph), &graph);
        assert_eq!(plan.break_points.len(), 3);
        assert!(plan.break_points.iter().all(|p| p.action == BreakAction::Lazy));
        assert_eq!(plan.deferred_relations.len(), 3);
    }
}
