use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Entity, EntitySet};
use crate::relation::InferredRelation;
use crate::types::RelationKind;

/// Summary of dependency graph structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GraphSummary {
    pub nodes: usize,
    /// Distinct `(from, to)` entity pairs.
    pub edges: usize,
}

/// One field-level dependency: `from` needs `to` to exist first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub field: String,
    pub optional: bool,
    pub kind: RelationKind,
}

/// An entity together with the names it depends on and the names depending on it.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    pub entity: Entity,
    pub dependencies: BTreeSet<String>,
    pub dependents: BTreeSet<String>,
}

impl DependencyNode {
    fn new(entity: Entity) -> Self {
        Self {
            entity,
            dependencies: BTreeSet::new(),
            dependents: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }
}

/// Directed entity graph keyed by entity name.
///
/// Nodes own their entity; edges refer to nodes by name only.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, DependencyNode>,
    edges: Vec<DependencyEdge>,
}

/// Build a deterministic dependency graph from entities and accepted relations.
///
/// Informational relations and relations naming unknown entities are skipped.
pub fn build_graph(entities: &EntitySet, relations: &[InferredRelation]) -> DependencyGraph {
    let mut graph = DependencyGraph::default();

    for entity in entities.iter() {
        graph
            .nodes
            .insert(entity.name.clone(), DependencyNode::new(entity.clone()));
    }

    for relation in relations {
        if relation.informational {
            continue;
        }
        if !graph.nodes.contains_key(&relation.from_entity)
            || !graph.nodes.contains_key(&relation.to_entity)
        {
            debug!(
                from = %relation.from_entity,
                to = %relation.to_entity,
                field = %relation.via_field,
                "skipping relation with unknown endpoint"
            );
            continue;
        }

        graph.add_edge(DependencyEdge {
            from: relation.from_entity.clone(),
            to: relation.to_entity.clone(),
            field: relation.via_field.clone(),
            optional: relation.optional,
            kind: relation.kind,
        });
    }

    graph
}

impl DependencyGraph {
    fn add_edge(&mut self, edge: DependencyEdge) {
        if self
            .edges
            .iter()
            .any(|existing| existing.from == edge.from && existing.to == edge.to && existing.field == edge.field)
        {
            return;
        }

        if let Some(node) = self.nodes.get_mut(&edge.from) {
            node.dependencies.insert(edge.to.clone());
        }
        if let Some(node) = self.nodes.get_mut(&edge.to) {
            node.dependents.insert(edge.from.clone());
        }
        self.edges.push(edge);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&DependencyNode> {
        self.nodes.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> {
        self.nodes.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Field-level edges for the ordered pair `from -> to`.
    pub fn edges_between<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
    ) -> impl Iterator<Item = &'a DependencyEdge> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.from == from && edge.to == to)
    }

    /// A pair is optional only when every field linking it is optional.
    pub fn is_optional_edge(&self, from: &str, to: &str) -> bool {
        let mut edges = self.edges_between(from, to).peekable();
        edges.peek().is_some() && edges.all(|edge| edge.optional)
    }

    pub fn dependencies(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(name).map(|node| &node.dependencies)
    }

    /// Entities with no dependencies, ready to generate immediately.
    pub fn independent_entities(&self) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|node| node.dependencies.is_empty())
            .map(DependencyNode::name)
            .collect()
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            nodes: self.nodes.len(),
            edges: self
                .nodes
                .values()
                .map(|node| node.dependencies.len())
                .sum(),
        }
    }

    /// Remove one field-level edge. The pair link disappears with its last field.
    pub fn remove_field_edge(&mut self, from: &str, to: &str, field: &str) -> bool {
        let before = self.edges.len();
        self.edges
            .retain(|edge| !(edge.from == from && edge.to == to && edge.field == field));
        let removed = self.edges.len() != before;

        if removed && self.edges_between(from, to).next().is_none() {
            if let Some(node) = self.nodes.get_mut(from) {
                node.dependencies.remove(to);
            }
            if let Some(node) = self.nodes.get_mut(to) {
                node.dependents.remove(from);
            }
        }

        removed
    }

    /// Dependencies-first order, or the nodes stuck on cycles.
    pub fn topological_order(&self) -> Result<Vec<String>, Vec<String>> {
        let mut pending: BTreeMap<&str, usize> = self
            .nodes
            .iter()
            .map(|(name, node)| (name.as_str(), node.dependencies.len()))
            .collect();

        let mut ready: BTreeSet<&str> = pending
            .iter()
            .filter_map(|(name, count)| if *count == 0 { Some(*name) } else { None })
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(name) = ready.pop_first() {
            order.push(name.to_string());

            if let Some(node) = self.nodes.get(name) {
                for dependent in &node.dependents {
                    if let Some(count) = pending.get_mut(dependent.as_str()) {
                        *count = count.saturating_sub(1);
                        if *count == 0 {
                            ready.insert(dependent.as_str());
                        }
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            let stuck = pending
                .into_iter()
                .filter_map(|(name, count)| if count > 0 { Some(name.to_string()) } else { None })
                .collect();
            Err(stuck)
        }
    }
}
