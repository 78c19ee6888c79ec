//! Pluggable cycle resolution strategies.

mod lazy_loading;
mod partial_references;
mod smart_break;

use std::collections::BTreeMap;

use schemock_core::{Cycle, DependencyGraph};

use crate::plan::{BreakAction, BreakPoint, DeferredRelation, ResolutionPlan};

pub use lazy_loading::LazyLoading;
pub use partial_references::PartialReferences;
pub use smart_break::SmartBreak;

/// A named policy turning one cycle into break points.
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Plan actions for `cycle`. `graph` is the resolver's working copy.
    fn resolve(&self, cycle: &Cycle, graph: &DependencyGraph) -> ResolutionPlan;
}

/// Strategy backed by a closure.
pub struct FnStrategy<F> {
    name: String,
    resolve: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(&Cycle, &DependencyGraph) -> ResolutionPlan + Send + Sync,
{
    pub fn new(name: impl Into<String>, resolve: F) -> Self {
        Self {
            name: name.into(),
            resolve,
        }
    }
}

impl<F> ResolutionStrategy for FnStrategy<F>
where
    F: Fn(&Cycle, &DependencyGraph) -> ResolutionPlan + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, cycle: &Cycle, graph: &DependencyGraph) -> ResolutionPlan {
        (self.resolve)(cycle, graph)
    }
}

/// Strategies available to a resolver, keyed by name.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Box<dyn ResolutionStrategy>>,
}

impl StrategyRegistry {
    /// Registry without any strategy.
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in strategies.
    pub fn with_builtin_strategies() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(SmartBreak));
        registry.register(Box::new(LazyLoading));
        registry.register(Box::new(PartialReferences));
        registry
    }

    /// Add or replace a strategy under its own name.
    pub fn register(&mut self, strategy: Box<dyn ResolutionStrategy>) {
        self.strategies.insert(strategy.name().to_string(), strategy);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ResolutionStrategy> {
        self.strategies.get(name).map(|strategy| strategy.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtin_strategies()
    }
}

/// Mark every field edge of `from -> to` with `action`, deferring each when asked.
pub(crate) fn mark_pair(
    plan: &mut ResolutionPlan,
    graph: &DependencyGraph,
    from: &str,
    to: &str,
    action: BreakAction,
    defer: bool,
) {
    for edge in graph.edges_between(from, to) {
        plan.add_break_point(BreakPoint {
            from_entity: edge.from.clone(),
            to_entity: edge.to.clone(),
            field: edge.field.clone(),
            action,
        });
        if defer {
            plan.add_deferred(DeferredRelation {
                entity: edge.from.clone(),
                field: edge.field.clone(),
                target_entity: edge.to.clone(),
            });
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use schemock_core::{
        Cycle, DependencyGraph, Entity, EntitySet, InferredRelation, RelationKind, build_graph,
        detect_cycles,
    };

    /// Graph from `(from, to, field, optional)` edges over the named entities.
    pub fn graph(names: &[&str], edges: &[(&str, &str, &str, bool)]) -> DependencyGraph {
        let set = EntitySet::from_entities(names.iter().map(|name| Entity::new(*name)))
            .expect("entity set");
        let relations: Vec<InferredRelation> = edges
            .iter()
            .map(|(from, to, field, optional)| InferredRelation {
                from_entity: from.to_string(),
                to_entity: to.to_string(),
                via_field: field.to_string(),
                kind: RelationKind::Direct,
                confidence: 1.0,
                optional: *optional,
                informational: false,
            })
            .collect();
        build_graph(&set, &relations)
    }

    pub fn first_cycle(graph: &DependencyGraph) -> Cycle {
        detect_cycles(graph).into_iter().next().expect("a cycle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered_by_name() {
        let registry = StrategyRegistry::default();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["lazy-loading", "partial-references", "smart-break"]
        );
        assert!(registry.get("smart-break").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn closures_register_as_strategies() {
        let mut registry = StrategyRegistry::empty();
        registry.register(Box::new(FnStrategy::new("noop", |_: &Cycle, _: &DependencyGraph| {
            ResolutionPlan::new("noop")
        })));
        let strategy = registry.get("noop").expect("registered");
        assert_eq!(strategy.name(), "noop");

        let graph = test_support::graph(&["A"], &[("A", "A", "parent", false)]);
        let cycle = test_support::first_cycle(&graph);
        assert!(strategy.resolve(&cycle, &graph).is_empty());
    }
}
