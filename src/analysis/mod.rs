// Dependency resolution and graph construction

pub mod graph;
pub mod resolver;

pub use graph::{cluster_by_directory, DependencyGraph, GraphMetrics, HierarchyMap};
pub use resolver::DependencyResolver;
