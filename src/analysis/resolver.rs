// Dependency resolution over internal module paths
//
// Maps raw import identifiers onto modules in the project using a textual
// overlap heuristic: an identifier references module M when it appears
// within M's dot-normalized path. Intentionally approximate; no search-path
// simulation and no handling of re-exports.

use crate::parser::ast::ModuleRecord;
use std::collections::BTreeMap;

/// Resolves raw dependency identifiers to internal module paths
pub struct DependencyResolver {
    /// (module path, dot-normalized path), in sorted path order
    modules: Vec<(String, String)>,
}

impl DependencyResolver {
    /// Create a resolver over the project's parsed modules
    pub fn new(modules: &BTreeMap<String, ModuleRecord>) -> Self {
        let modules = modules
            .values()
            .map(|m| (m.path.clone(), m.dotted_path()))
            .collect();
        Self { modules }
    }

    /// All modules the identifier may reference, excluding `from_module`
    /// itself. Candidates come back in sorted module-path order. The
    /// returned paths borrow from the resolver, not the query strings.
    pub fn matches(&self, from_module: &str, identifier: &str) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|(path, dotted)| path != from_module && references(identifier, dotted))
            .map(|(path, _)| path.as_str())
            .collect()
    }

    /// The first matching module in iteration order, if any. This is the
    /// match the canonical dependency graph uses; stopping at the first hit
    /// keeps the graph sparse when an identifier is ambiguous.
    pub fn first_match(&self, from_module: &str, identifier: &str) -> Option<&str> {
        self.modules
            .iter()
            .find(|(path, dotted)| path != from_module && references(identifier, dotted))
            .map(|(path, _)| path.as_str())
    }

    /// Resolve every identifier of every module, recording all matches
    pub fn resolve_all(
        &self,
        modules: &BTreeMap<String, ModuleRecord>,
    ) -> BTreeMap<String, Vec<String>> {
        modules
            .values()
            .map(|module| {
                let mut resolved: Vec<String> = module
                    .dependencies
                    .iter()
                    .flat_map(|id| self.matches(&module.path, id))
                    .map(str::to_string)
                    .collect();
                resolved.sort();
                resolved.dedup();
                (module.path.clone(), resolved)
            })
            .collect()
    }
}

/// The textual overlap heuristic
fn references(identifier: &str, dotted_path: &str) -> bool {
    !identifier.is_empty() && dotted_path.contains(identifier)
}
