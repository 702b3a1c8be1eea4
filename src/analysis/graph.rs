// Directed module dependency graph and its derived metrics

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Parent directory -> module paths, with top-level modules under "root"
pub type HierarchyMap = BTreeMap<String, Vec<String>>;

const ROOT_CLUSTER: &str = "root";
const MOST_CONNECTED_LIMIT: usize = 5;

/// A directed graph over module paths. An edge A -> B means A imports
/// (depends on) B. Self-loops are rejected and duplicate edges collapse.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    indices: BTreeMap<String, NodeIndex>,
    /// Node insertion order, used for deterministic tie-breaking
    order: Vec<String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            indices: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// Ensure a node exists for the module path
    pub fn add_node(&mut self, module: &str) -> NodeIndex {
        if let Some(&index) = self.indices.get(module) {
            return index;
        }
        let index = self.graph.add_node(module.to_string());
        self.indices.insert(module.to_string(), index);
        self.order.push(module.to_string());
        index
    }

    /// Add a dependency edge. Self-loops and duplicates are no-ops; both
    /// endpoints are created if missing.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let a = self.add_node(from);
        let b = self.add_node(to);
        if !self.graph.contains_edge(a, b) {
            self.graph.add_edge(a, b, ());
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, module: &str) -> bool {
        self.indices.contains_key(module)
    }

    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        match (self.indices.get(from), self.indices.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Module paths in insertion order
    pub fn nodes(&self) -> &[String] {
        &self.order
    }

    /// All (from, to) edges, ordered by source insertion then target
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut edges = Vec::with_capacity(self.graph.edge_count());
        for module in &self.order {
            if let Some(&index) = self.indices.get(module) {
                let mut targets: Vec<String> = self
                    .graph
                    .neighbors_directed(index, Direction::Outgoing)
                    .map(|n| self.graph[n].clone())
                    .collect();
                targets.sort();
                for target in targets {
                    edges.push((module.clone(), target));
                }
            }
        }
        edges
    }

    /// Number of modules that import this one
    pub fn in_degree(&self, module: &str) -> usize {
        self.degree(module, Direction::Incoming)
    }

    /// Number of modules this one imports
    pub fn out_degree(&self, module: &str) -> usize {
        self.degree(module, Direction::Outgoing)
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    fn degree(&self, module: &str, direction: Direction) -> usize {
        self.indices
            .get(module)
            .map(|&index| self.graph.neighbors_directed(index, direction).count())
            .unwrap_or(0)
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for DependencyGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DependencyGraph", 2)?;
        state.serialize_field("nodes", &self.order)?;
        state.serialize_field("edges", &self.edges())?;
        state.end()
    }
}

/// Summary metrics over a dependency graph.
///
/// Centrality maps are empty for graphs with at most one node, where the
/// `degree / (n - 1)` normalization is undefined.
#[derive(Debug, Clone, Serialize)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    /// edges / (n * (n - 1)); 0.0 when the graph has fewer than two nodes
    pub density: f64,
    pub is_acyclic: bool,
    /// Modules nothing imports (in-degree 0), in sorted order
    pub entry_points: Vec<String>,
    /// Modules importing nothing internal (out-degree 0), in sorted order
    pub leaf_modules: Vec<String>,
    pub in_degree_centrality: BTreeMap<String, f64>,
    pub out_degree_centrality: BTreeMap<String, f64>,
    /// Up to five (module, in + out degree) pairs, highest first
    pub most_connected: Vec<(String, usize)>,
}

impl GraphMetrics {
    pub fn compute(graph: &DependencyGraph) -> Self {
        let node_count = graph.node_count();
        let edge_count = graph.edge_count();

        let density = if node_count < 2 {
            0.0
        } else {
            edge_count as f64 / (node_count as f64 * (node_count as f64 - 1.0))
        };

        let mut entry_points = Vec::new();
        let mut leaf_modules = Vec::new();
        let mut in_degree_centrality = BTreeMap::new();
        let mut out_degree_centrality = BTreeMap::new();

        for module in graph.nodes() {
            let in_degree = graph.in_degree(module);
            let out_degree = graph.out_degree(module);
            if in_degree == 0 {
                entry_points.push(module.clone());
            }
            if out_degree == 0 {
                leaf_modules.push(module.clone());
            }
            if node_count > 1 {
                let scale = (node_count - 1) as f64;
                in_degree_centrality.insert(module.clone(), in_degree as f64 / scale);
                out_degree_centrality.insert(module.clone(), out_degree as f64 / scale);
            }
        }
        entry_points.sort();
        leaf_modules.sort();

        // Stable sort keeps insertion order among equal degrees
        let mut by_degree: Vec<(String, usize)> = graph
            .nodes()
            .iter()
            .map(|m| (m.clone(), graph.in_degree(m) + graph.out_degree(m)))
            .collect();
        by_degree.sort_by(|a, b| b.1.cmp(&a.1));
        by_degree.truncate(MOST_CONNECTED_LIMIT);

        Self {
            node_count,
            edge_count,
            density,
            is_acyclic: graph.is_acyclic(),
            entry_points,
            leaf_modules,
            in_degree_centrality,
            out_degree_centrality,
            most_connected: by_degree,
        }
    }
}

/// Group module paths by immediate parent directory. Top-level modules land
/// under the "root" key; keys and member lists come back sorted.
pub fn cluster_by_directory<'a, I>(module_paths: I) -> HierarchyMap
where
    I: IntoIterator<Item = &'a str>,
{
    let mut clusters: HierarchyMap = BTreeMap::new();
    for path in module_paths {
        let parent = match path.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => ROOT_CLUSTER.to_string(),
        };
        clusters.entry(parent).or_default().push(path.to_string());
    }
    for members in clusters.values_mut() {
        members.sort();
    }
    clusters
}
