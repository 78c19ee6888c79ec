use tracing::{debug, info, warn};

use schemock_core::{
    Cycle, DependencyGraph, EntitySet, InferredRelation, build_graph, detect_cycles,
    select_primary_cycle,
};

use crate::errors::{ResolutionWarning, ResolveError, Result};
use crate::inference::infer_relations;
use crate::options::ResolveOptions;
use crate::plan::{ResolutionOutput, ResolutionPlan};
use crate::planner::apply_plan;
use crate::strategy::{FnStrategy, ResolutionStrategy, StrategyRegistry};

/// Turns an entity set into a generation order, resolving cycles with the
/// preferred strategy.
///
/// Each resolver owns its strategy registry, so resolvers with different
/// strategy sets can run side by side.
pub struct DependencyResolver {
    strategies: StrategyRegistry,
    options: ResolveOptions,
}

impl DependencyResolver {
    /// Resolver with the built-in strategies and default options.
    pub fn new() -> Self {
        Self {
            strategies: StrategyRegistry::with_builtin_strategies(),
            options: ResolveOptions::default(),
        }
    }

    /// Resolver with the built-in strategies; fails if `options.strategy`
    /// is not one of them.
    pub fn with_options(options: ResolveOptions) -> Result<Self> {
        Self::with_registry(StrategyRegistry::with_builtin_strategies(), options)
    }

    pub fn with_registry(strategies: StrategyRegistry, options: ResolveOptions) -> Result<Self> {
        if !strategies.contains(&options.strategy) {
            return Err(ResolveError::UnknownStrategy(options.strategy));
        }
        Ok(Self {
            strategies,
            options,
        })
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn preferred_strategy(&self) -> &str {
        &self.options.strategy
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Register a closure as a named strategy.
    pub fn register_strategy<F>(&mut self, name: impl Into<String>, resolve: F)
    where
        F: Fn(&Cycle, &DependencyGraph) -> ResolutionPlan + Send + Sync + 'static,
    {
        self.register(Box::new(FnStrategy::new(name, resolve)));
    }

    pub fn register(&mut self, strategy: Box<dyn ResolutionStrategy>) {
        debug!(strategy = %strategy.name(), "strategy registered");
        self.strategies.register(strategy);
    }

    pub fn set_preferred_strategy(&mut self, name: &str) -> Result<()> {
        if !self.strategies.contains(name) {
            return Err(ResolveError::UnknownStrategy(name.to_string()));
        }
        self.options.strategy = name.to_string();
        Ok(())
    }

    /// Infer relations, build the graph, and order it.
    ///
    /// Acyclic graphs are ordered topologically without a plan. Otherwise the
    /// primary cycle is resolved and the working graph re-checked until no
    /// cycle remains or the strategy stops removing edges.
    pub fn resolve_dependencies(&self, entities: &EntitySet) -> ResolutionOutput {
        let relations = infer_relations(entities, &self.options.inference);
        let mut warnings = Vec::new();
        if let Some(warning) = below_threshold(&relations, self.options.inference.confidence_threshold)
        {
            warn!(%warning, "relations filtered by confidence");
            warnings.push(warning);
        }

        let graph = build_graph(entities, &relations);
        let summary = graph.summary();
        let cycles = detect_cycles(&graph);

        if cycles.is_empty() {
            if let Ok(order) = graph.topological_order() {
                info!(
                    entities = summary.nodes,
                    edges = summary.edges,
                    "dependency graph is acyclic"
                );
                return ResolutionOutput {
                    generation_order: order,
                    resolution_plan: None,
                    cycles,
                    relations,
                    summary,
                    warnings,
                };
            }
        }

        let mut plan = self.plan_cycles(&graph);
        let placed = apply_plan(&plan, &graph);
        plan.generation_order = placed.entities.clone();
        warnings.extend(placed.warnings());

        info!(
            entities = summary.nodes,
            edges = summary.edges,
            cycles = cycles.len(),
            strategy = %plan.strategy,
            break_points = plan.break_points.len(),
            unplaced = placed.unplaced.len(),
            "dependency cycles resolved"
        );

        ResolutionOutput {
            generation_order: placed.entities,
            resolution_plan: Some(plan),
            cycles,
            relations,
            summary,
            warnings,
        }
    }

    fn plan_cycles(&self, graph: &DependencyGraph) -> ResolutionPlan {
        let name = self.preferred_strategy();
        let mut plan = ResolutionPlan::new(name);
        let Some(strategy) = self.strategies.get(name) else {
            return plan;
        };

        let mut working = graph.clone();
        for pass in 1..=self.options.max_passes {
            let cycles = detect_cycles(&working);
            let Some(primary) = select_primary_cycle(&cycles) else {
                break;
            };

            let step = strategy.resolve(primary, &working);
            let removed = step
                .break_points
                .iter()
                .filter(|point| {
                    working.remove_field_edge(&point.from_entity, &point.to_entity, &point.field)
                })
                .count();
            debug!(
                pass,
                cycle = %primary,
                kind = ?primary.kind,
                strength = ?primary.strength,
                removed,
                "resolved primary cycle"
            );
            plan.merge(step);

            if removed == 0 {
                warn!(strategy = %name, cycle = %primary, "strategy removed no edges; stopping");
                break;
            }
        }
        plan
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn below_threshold(relations: &[InferredRelation], threshold: f64) -> Option<ResolutionWarning> {
    let count = relations.iter().filter(|relation| relation.informational).count();
    (count > 0).then_some(ResolutionWarning::RelationsBelowThreshold { count, threshold })
}
