use std::collections::BTreeMap;

use tracing::warn;

use schemock_core::DependencyGraph;

use crate::errors::ResolutionWarning;
use crate::plan::ResolutionPlan;

/// Final order produced by applying a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacedOrder {
    /// Every entity exactly once; unplaced entities come last.
    pub entities: Vec<String>,
    /// Entities still on, or behind, a cycle the plan did not cut.
    pub unplaced: Vec<String>,
}

impl PlacedOrder {
    pub fn warnings(&self) -> Vec<ResolutionWarning> {
        self.unplaced
            .iter()
            .map(|entity| ResolutionWarning::UnplacedEntity {
                entity: entity.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Placed,
    Blocked,
}

/// Order entities dependencies-first after removing every planned edge.
///
/// Works on a copy of `graph`. Entities that cannot be ordered are appended
/// in post-order and logged rather than dropped.
pub fn apply_plan(plan: &ResolutionPlan, graph: &DependencyGraph) -> PlacedOrder {
    let mut working = graph.clone();
    for point in &plan.break_points {
        working.remove_field_edge(&point.from_entity, &point.to_entity, &point.field);
    }

    let mut walk = PostOrder {
        graph: &working,
        marks: BTreeMap::new(),
        placed: Vec::with_capacity(working.len()),
        blocked: Vec::new(),
    };
    for name in working.names() {
        if !walk.marks.contains_key(name) {
            walk.visit(name);
        }
    }

    for entity in &walk.blocked {
        warn!(entity = %entity, strategy = %plan.strategy, "entity could not be placed; appending");
    }

    let unplaced: Vec<String> = walk.blocked.iter().map(|name| name.to_string()).collect();
    let mut entities: Vec<String> = walk.placed.iter().map(|name| name.to_string()).collect();
    entities.extend(unplaced.iter().cloned());

    PlacedOrder { entities, unplaced }
}

struct PostOrder<'a> {
    graph: &'a DependencyGraph,
    marks: BTreeMap<&'a str, Mark>,
    placed: Vec<&'a str>,
    blocked: Vec<&'a str>,
}

impl<'a> PostOrder<'a> {
    /// Returns whether `name` was placed.
    fn visit(&mut self, name: &'a str) -> bool {
        self.marks.insert(name, Mark::Visiting);

        let graph = self.graph;
        let mut placeable = true;
        if let Some(dependencies) = graph.dependencies(name) {
            for dependency in dependencies {
                let dependency = dependency.as_str();
                let ready = match self.marks.get(dependency) {
                    Some(Mark::Placed) => true,
                    Some(Mark::Visiting | Mark::Blocked) => false,
                    None => self.visit(dependency),
                };
                placeable &= ready;
            }
        }

        if placeable {
            self.marks.insert(name, Mark::Placed);
            self.placed.push(name);
        } else {
            self.marks.insert(name, Mark::Blocked);
            self.blocked.push(name);
        }
        placeable
    }
}
