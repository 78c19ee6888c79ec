use tracing::debug;

use schemock_core::{Cycle, DependencyGraph};

use super::{ResolutionStrategy, mark_pair};
use crate::plan::{BreakAction, ResolutionPlan};

/// Defers the first optional edge of a cycle, or force-breaks the first edge
/// when every edge is required.
///
/// Edges are scanned in path order, so the forced break always leaves the
/// cycle's entry entity (the first one reached by the name-ordered DFS).
/// The recorded break point is the dependency edge actually removed, so its
/// `from_entity` is the dependent entity and ends up generated first.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartBreak;

impl ResolutionStrategy for SmartBreak {
    fn name(&self) -> &str {
        "smart-break"
    }

    fn resolve(&self, cycle: &Cycle, graph: &DependencyGraph) -> ResolutionPlan {
        let mut plan = ResolutionPlan::new(self.name());

        if let Some((from, to)) = cycle
            .edges()
            .find(|(from, to)| graph.is_optional_edge(from, to))
        {
            debug!(from, to, "deferring optional edge");
            mark_pair(&mut plan, graph, from, to, BreakAction::Defer, true);
            return plan;
        }

        if let Some((from, to)) = cycle.edges().next() {
            debug!(from, to, "force-breaking required edge");
            mark_pair(&mut plan, graph, from, to, BreakAction::Break, false);
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{first_cycle, graph};

    #[test]
    fn defers_optional_edge_before_breaking() {
        let graph = graph(
            &["A", "B", "C"],
            &[("A", "B", "b", false), ("B", "C", "c", true), ("C", "A", "a", false)],
        );
        let cycle = first_cycle(&graph);
        let plan = SmartBreak.resolve(&cycle, &graph);

        assert_eq!(plan.break_points.len(), 1);
        let point = &plan.break_points[0];
        assert_eq!((point.from_entity.as_str(), point.field.as_str()), ("B", "c"));
        assert_eq!(point.action, BreakAction::Defer);
        assert_eq!(plan.deferred_relations.len(), 1);
        assert!(plan.break_points.iter().all(|p| p.action != BreakAction::Break));
    }

    #[test]
    fn force_breaks_first_edge_of_strong_cycle() {
        let graph = graph(
            &["Post", "User"],
            &[("User", "Post", "posts", false), ("Post", "User", "author", false)],
        );
        let cycle = first_cycle(&graph);
        assert_eq!(cycle.path, vec!["Post", "User", "Post"]);

        let plan = SmartBreak.resolve(&cycle, &graph);
        assert_eq!(plan.break_points.len(), 1);
        let point = &plan.break_points[0];
        assert_eq!((point.from_entity.as_str(), point.to_entity.as_str()), ("Post", "User"));
        assert_eq!(point.field, "author");
        assert_eq!(point.action, BreakAction::Break);
        assert!(plan.deferred_relations.is_empty());
    }

    #[test]
    fn breaks_every_field_of_the_chosen_pair() {
        let graph = graph(
            &["A", "B"],
            &[("A", "B", "owner", false), ("A", "B", "creator", false), ("B", "A", "a", false)],
        );
        let plan = SmartBreak.resolve(&first_cycle(&graph), &graph);
        let fields: Vec<_> = plan.break_points.iter().map(|p| p.field.as_str()).collect();
        assert_eq!(fields, vec!["owner", "creator"]);
    }
}
