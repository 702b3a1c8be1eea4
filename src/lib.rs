//! codemap - Build a queryable structural model of a codebase
//!
//! Walks a project tree, extracts declarations from Python sources, resolves
//! internal dependencies and assembles everything into a read-only
//! [`ProjectModel`](scanner::ProjectModel) with a directed dependency graph
//! and derived metrics.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod scanner;

// Re-export main types
pub use config::Config;
pub use error::{Error, Result};
pub use scanner::{scan, ProjectModel, Scanner, Stats};
