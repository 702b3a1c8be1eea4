// Scan pipeline: walk, parse, resolve, graph
//
// Runs the full pipeline over a project root and assembles the read-only
// ProjectModel. The walk is sequential (it defines ordering); parsing is
// fanned out per file with rayon and merged back into deterministic maps.

pub mod tree;

use crate::analysis::{
    cluster_by_directory, DependencyGraph, DependencyResolver, GraphMetrics, HierarchyMap,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::{ModuleRecord, PythonParser, SourceParser};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tree::{FileEntry, TreeNode, WalkedTree};

/// Aggregate project statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub total_files: u64,
    pub total_directories: u64,
    pub total_lines: u64,
    /// Files per lower-cased extension
    pub file_types: BTreeMap<String, u64>,
    /// Files the parser handles, whether or not they parsed
    pub source_files: u64,
    /// Source files dropped for syntax or read errors
    pub skipped_files: u64,
    pub classes: u64,
    pub functions: u64,
    pub imports: u64,
    /// Project-wide lines over source file count; 0.0 without source files
    pub avg_lines_per_source_file: f64,
}

/// The assembled result of a scan. Construction happens only through
/// [`Scanner::scan`]; afterwards the model is read-only.
#[derive(Debug, Serialize)]
pub struct ProjectModel {
    /// Project name, taken from the root directory name
    pub name: String,
    /// Absolute root the scan ran over
    pub root: PathBuf,
    pub tree: TreeNode,
    /// Parsed modules keyed by root-relative path
    pub modules: BTreeMap<String, ModuleRecord>,
    /// Every internal module each module's identifiers may refer to
    pub dependencies: BTreeMap<String, Vec<String>>,
    pub graph: DependencyGraph,
    pub metrics: GraphMetrics,
    pub hierarchy: HierarchyMap,
    pub stats: Stats,
}

impl ProjectModel {
    pub fn module(&self, path: &str) -> Option<&ModuleRecord> {
        self.modules.get(path)
    }
}

/// Runs the scan pipeline
pub struct Scanner {
    config: Config,
    show_progress: bool,
}

impl Scanner {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            show_progress: false,
        })
    }

    /// Render a progress bar during the parse stage
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Scan a project root into a [`ProjectModel`].
    ///
    /// Fails only when `root` is missing or not a directory, or when the
    /// parser grammar cannot be loaded. Unreadable and unparseable files
    /// are logged and skipped, never fatal.
    pub fn scan(&self, root: &Path) -> Result<ProjectModel> {
        if !root.is_dir() {
            return Err(Error::InvalidRoot(root.to_path_buf()));
        }
        let root = root.canonicalize()?;
        info!("scanning {}", root.display());

        let walked = tree::walk(&root, &self.config.scan);
        debug!(
            "walked {} files in {} directories",
            walked.totals.files, walked.totals.directories
        );

        // Grammar problems surface here rather than per file
        let probe = PythonParser::new()?;
        let source_files: Vec<&FileEntry> = walked
            .files
            .iter()
            .filter(|f| probe.handles(&f.extension))
            .collect();

        let (modules, skipped) = parse_files(&source_files, self.show_progress);
        info!(
            "parsed {} modules, skipped {}",
            modules.len(),
            skipped
        );

        let resolver = DependencyResolver::new(&modules);
        let dependencies = resolver.resolve_all(&modules);

        let mut graph = DependencyGraph::new();
        for module in modules.values() {
            graph.add_node(&module.path);
        }
        for module in modules.values() {
            for identifier in &module.dependencies {
                if let Some(target) = resolver.first_match(&module.path, identifier) {
                    graph.add_edge(&module.path, target);
                }
            }
        }

        let metrics = GraphMetrics::compute(&graph);
        let hierarchy = cluster_by_directory(modules.keys().map(String::as_str));
        let stats = compute_stats(&walked, &modules, source_files.len() as u64, skipped);

        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());

        Ok(ProjectModel {
            name,
            root,
            tree: walked.root,
            modules,
            dependencies,
            graph,
            metrics,
            hierarchy,
            stats,
        })
    }
}

/// One-call scan with explicit traversal controls, using defaults for
/// everything else
pub fn scan(
    root: &Path,
    max_depth: Option<usize>,
    exclude: &[String],
    include_hidden: bool,
) -> Result<ProjectModel> {
    let mut config = Config::default();
    config.scan.max_depth = max_depth;
    if !exclude.is_empty() {
        config.scan.exclude = exclude.to_vec();
    }
    config.scan.include_hidden = include_hidden;

    Scanner::new(config)?.scan(root)
}

/// Parse source files in parallel, returning modules keyed by path and the
/// number of files skipped. Each worker owns its parser; tree-sitter
/// parsers are not shareable across threads.
fn parse_files(
    source_files: &[&FileEntry],
    show_progress: bool,
) -> (BTreeMap<String, ModuleRecord>, u64) {
    let progress = if show_progress {
        let bar = ProgressBar::new(source_files.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(bar)
    } else {
        None
    };

    let parsed: Vec<Option<(String, ModuleRecord)>> = source_files
        .par_iter()
        .map(|entry| {
            let result = parse_one(entry);
            if let Some(bar) = &progress {
                bar.inc(1);
            }
            match result {
                Ok(module) => Some((entry.rel_path.clone(), module)),
                Err(e) => {
                    warn!("skipping {}: {}", entry.rel_path, e);
                    None
                }
            }
        })
        .collect();

    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    let mut modules = BTreeMap::new();
    let mut skipped = 0u64;
    for item in parsed {
        match item {
            Some((path, module)) => {
                modules.insert(path, module);
            }
            None => skipped += 1,
        }
    }
    (modules, skipped)
}

fn parse_one(entry: &FileEntry) -> Result<ModuleRecord> {
    let bytes = std::fs::read(&entry.abs_path)?;
    let (source, _encoding) = tree::decode(&bytes)
        .ok_or_else(|| Error::parse(&entry.rel_path, "undecodable content"))?;
    let mut parser = PythonParser::new()?;
    parser.parse_source(&source, &entry.rel_path)
}

fn compute_stats(
    walked: &WalkedTree,
    modules: &BTreeMap<String, ModuleRecord>,
    source_files: u64,
    skipped: u64,
) -> Stats {
    let classes = modules.values().map(|m| m.classes.len() as u64).sum();
    let functions = modules.values().map(|m| m.functions.len() as u64).sum();
    let imports = modules.values().map(|m| m.imports.len() as u64).sum();

    let avg_lines_per_source_file = if source_files == 0 {
        0.0
    } else {
        walked.totals.lines as f64 / source_files as f64
    };

    Stats {
        total_files: walked.totals.files,
        total_directories: walked.totals.directories,
        total_lines: walked.totals.lines,
        file_types: walked.totals.by_extension.clone(),
        source_files,
        skipped_files: skipped,
        classes,
        functions,
        imports,
        avg_lines_per_source_file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_rejects_missing_root() {
        let err = scan(Path::new("/no/such/dir"), None, &[], false).unwrap_err();
        assert!(matches!(err, Error::InvalidRoot(_)));
    }

    #[test]
    fn test_scan_rejects_file_root() {
        let dir = TempDir::new().unwrap();
        write(&dir, "file.py", "x = 1\n");

        let err = scan(&dir.path().join("file.py"), None, &[], false).unwrap_err();
        assert!(matches!(err, Error::InvalidRoot(_)));
    }

    #[test]
    fn test_scan_builds_model() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "a.py",
            "import b\n\ndef f(x):\n    if x:\n        for i in x:\n            pass\n",
        );
        write(&dir, "b.py", "VALUE = 1\n");

        let model = scan(dir.path(), None, &[], false).unwrap();

        assert_eq!(model.modules.len(), 2);
        assert_eq!(model.stats.source_files, 2);
        assert_eq!(model.stats.functions, 1);
        assert_eq!(model.modules["a.py"].functions[0].complexity, 3);
        assert!(model.graph.contains_edge("a.py", "b.py"));
        assert_eq!(model.metrics.entry_points, vec!["a.py"]);
        assert_eq!(model.metrics.leaf_modules, vec!["b.py"]);
        assert!(model.metrics.is_acyclic);
        assert_eq!(model.dependencies["a.py"], vec!["b.py"]);
    }

    #[test]
    fn test_scan_skips_syntax_errors() {
        let dir = TempDir::new().unwrap();
        write(&dir, "good.py", "x = 1\n");
        write(&dir, "bad.py", "def broken(:\n");

        let model = scan(dir.path(), None, &[], false).unwrap();

        // The broken file stays in the tree and totals but yields no module
        assert_eq!(model.stats.total_files, 2);
        assert_eq!(model.stats.source_files, 2);
        assert_eq!(model.stats.skipped_files, 1);
        assert_eq!(model.modules.len(), 1);
        assert!(model.modules.contains_key("good.py"));
    }

    #[test]
    fn test_scan_excluded_directory_contributes_nothing() {
        let dir = TempDir::new().unwrap();
        write(&dir, "main.py", "import helper\n");
        write(&dir, "venv/helper.py", "x = 1\n");

        let model = scan(dir.path(), None, &[], false).unwrap();

        assert_eq!(model.modules.len(), 1);
        assert!(model.dependencies["main.py"].is_empty());
        assert_eq!(model.graph.edge_count(), 0);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write(&dir, "x.py", "import y\n");
        write(&dir, "y.py", "import z\n");
        write(&dir, "z.py", "A = 1\n");

        let first = scan(dir.path(), None, &[], false).unwrap();
        let second = scan(dir.path(), None, &[], false).unwrap();

        assert_eq!(first.modules, second.modules);
        assert_eq!(first.dependencies, second.dependencies);
        assert_eq!(first.graph.edges(), second.graph.edges());
        assert_eq!(first.metrics.entry_points, second.metrics.entry_points);
    }

    #[test]
    fn test_hierarchy_uses_root_sentinel() {
        let dir = TempDir::new().unwrap();
        write(&dir, "top.py", "");
        write(&dir, "pkg/inner.py", "");

        let model = scan(dir.path(), None, &[], false).unwrap();

        assert_eq!(model.hierarchy["root"], vec!["top.py"]);
        assert_eq!(model.hierarchy["pkg"], vec!["pkg/inner.py"]);
    }

    #[test]
    fn test_stats_average_lines() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.py", "x = 1\ny = 2\n");
        write(&dir, "notes.md", "hello\n");

        let model = scan(dir.path(), None, &[], false).unwrap();

        // total project lines over source file count
        assert_eq!(model.stats.source_files, 1);
        let expected = model.stats.total_lines as f64;
        assert!((model.stats.avg_lines_per_source_file - expected).abs() < 1e-9);
    }

    #[test]
    fn test_model_serializes_to_json() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.py", "import b\n");
        write(&dir, "b.py", "B = 2\n");

        let model = scan(dir.path(), None, &[], false).unwrap();
        let json = serde_json::to_value(&model).unwrap();

        assert_eq!(json["modules"]["a.py"]["path"], "a.py");
        assert!(json["graph"]["edges"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!(["a.py", "b.py"])));
        assert_eq!(json["metrics"]["node_count"], 2);
    }
}
