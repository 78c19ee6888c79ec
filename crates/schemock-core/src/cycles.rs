//! Cycle detection and classification over a [`DependencyGraph`].

use std::collections::BTreeSet;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::graph::DependencyGraph;

/// Shape of a cycle by distinct node count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CycleKind {
    SelfReference,
    /// Two or three entities.
    Simple,
    Complex,
}

/// Whether a cycle can be cut without violating a required relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CycleStrength {
    /// At least one traversed edge is optional.
    Weak,
    /// Every traversed edge is required.
    Strong,
}

/// A loop in the dependency graph. `path` repeats its first entity at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Cycle {
    pub path: Vec<String>,
    pub kind: CycleKind,
    pub strength: CycleStrength,
}

impl Cycle {
    /// Classify a closed path (`first == last`) against the graph it came from.
    pub fn from_path(path: Vec<String>, graph: &DependencyGraph) -> Self {
        let distinct = path.len().saturating_sub(1).max(1);
        let kind = match distinct {
            1 => CycleKind::SelfReference,
            2 | 3 => CycleKind::Simple,
            _ => CycleKind::Complex,
        };

        let weak = path
            .windows(2)
            .any(|pair| graph.is_optional_edge(&pair[0], &pair[1]));
        let strength = if weak {
            CycleStrength::Weak
        } else {
            CycleStrength::Strong
        };

        Self {
            path,
            kind,
            strength,
        }
    }

    /// Number of distinct entities on the cycle.
    pub fn len(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entities(&self) -> &[String] {
        &self.path[..self.len()]
    }

    /// Traversed `(from, to)` pairs in path order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.path
            .windows(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }

    pub fn is_weak(&self) -> bool {
        self.strength == CycleStrength::Weak
    }

    fn significance(&self) -> (u8, u8, usize) {
        let kind = match self.kind {
            CycleKind::SelfReference => 0,
            CycleKind::Simple => 1,
            CycleKind::Complex => 2,
        };
        let strength = match self.strength {
            CycleStrength::Weak => 0,
            CycleStrength::Strong => 1,
        };
        (kind, strength, self.len())
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join(" -> "))?;
        if self.kind == CycleKind::SelfReference {
            write!(f, " (self-reference)")?;
        }
        Ok(())
    }
}

/// Find cycles with a DFS over every unvisited entity, in name order.
///
/// Each back edge to an entity still on the recursion stack yields one cycle,
/// so independent cycles in disjoint subgraphs are all reported.
pub fn detect_cycles(graph: &DependencyGraph) -> Vec<Cycle> {
    let mut finder = CycleFinder::new(graph);
    for name in graph.names() {
        if !finder.visited.contains(name) {
            finder.visit(name);
        }
    }
    finder.cycles
}

/// Pick the cycle to resolve first: complex over simple over self-reference,
/// strong over weak, then longest. Ties keep detection order.
pub fn select_primary_cycle(cycles: &[Cycle]) -> Option<&Cycle> {
    let mut best: Option<&Cycle> = None;
    for cycle in cycles {
        match best {
            Some(current) if cycle.significance() <= current.significance() => {}
            _ => best = Some(cycle),
        }
    }
    best
}

struct CycleFinder<'a> {
    graph: &'a DependencyGraph,
    visited: BTreeSet<&'a str>,
    on_stack: BTreeSet<&'a str>,
    stack: Vec<&'a str>,
    cycles: Vec<Cycle>,
}

impl<'a> CycleFinder<'a> {
    fn new(graph: &'a DependencyGraph) -> Self {
        Self {
            graph,
            visited: BTreeSet::new(),
            on_stack: BTreeSet::new(),
            stack: Vec::new(),
            cycles: Vec::new(),
        }
    }

    fn visit(&mut self, name: &'a str) {
        self.visited.insert(name);
        self.on_stack.insert(name);
        self.stack.push(name);

        let graph = self.graph;
        if let Some(dependencies) = graph.dependencies(name) {
            for dependency in dependencies {
                let dependency = dependency.as_str();
                if self.on_stack.contains(dependency) {
                    self.record_cycle(dependency);
                } else if !self.visited.contains(dependency) {
                    self.visit(dependency);
                }
            }
        }

        self.stack.pop();
        self.on_stack.remove(name);
    }

    fn record_cycle(&mut self, entry: &str) {
        let Some(start) = self.stack.iter().position(|name| *name == entry) else {
            return;
        };
        let mut path: Vec<String> = self.stack[start..]
            .iter()
            .map(|name| (*name).to_string())
            .collect();
        path.push(entry.to_string());
        self.cycles.push(Cycle::from_path(path, self.graph));
    }
}
