// Directory tree walker and per-file statistics
//
// Walks a project root into a nested TreeNode model while accumulating flat
// file entries and running totals. Traversal is deterministic: directories
// first, then case-insensitive by name. Excluded and hidden entries are
// skipped entirely; unreadable directories are logged and treated as empty
// subtrees.

use crate::config::ScanConfig;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Kind of tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    File,
}

/// A file or directory in the scanned tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Entry name
    pub name: String,
    /// File or directory
    pub kind: NodeKind,
    /// Path relative to the scan root, '/'-separated; empty for the root
    pub path: String,
    /// Depth below the root; the root itself is 0
    pub depth: usize,
    /// Child nodes, directories before files (directories only)
    pub children: Vec<TreeNode>,
    /// Per-file statistics (files only)
    pub file: Option<FileStats>,
}

impl TreeNode {
    fn directory(name: String, path: String, depth: usize) -> Self {
        Self {
            name,
            kind: NodeKind::Directory,
            path,
            depth,
            children: Vec::new(),
            file: None,
        }
    }

    fn file(name: String, path: String, depth: usize, stats: FileStats) -> Self {
        Self {
            name,
            kind: NodeKind::File,
            path,
            depth,
            children: Vec::new(),
            file: Some(stats),
        }
    }

    /// Count all descendant nodes of the given kind, including self
    pub fn count(&self, kind: NodeKind) -> u64 {
        let own = u64::from(self.kind == kind);
        own + self.children.iter().map(|c| c.count(kind)).sum::<u64>()
    }
}

/// Statistics for a single file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStats {
    /// Lower-cased extension without the dot, empty when absent
    pub extension: String,
    /// File size in bytes
    pub size: u64,
    /// Line counts; all zero when the file could not be decoded
    pub lines: LineCounts,
    /// Detected text encoding
    pub encoding: Encoding,
}

/// Line counts for a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCounts {
    pub total: u64,
    pub blank: u64,
    pub comment: u64,
    pub code: u64,
}

/// Text encoding detected by the fallback sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Utf8,
    Latin1,
    /// No attempted encoding produced text
    Unknown,
}

/// A file found during the walk, for the parse stage
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Path relative to the scan root, '/'-separated
    pub rel_path: String,
    /// Absolute path on disk
    pub abs_path: PathBuf,
    /// Lower-cased extension without the dot
    pub extension: String,
}

/// Running totals accumulated during the walk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkTotals {
    pub files: u64,
    pub directories: u64,
    pub lines: u64,
    pub by_extension: BTreeMap<String, u64>,
}

/// Result of walking a project root
#[derive(Debug)]
pub struct WalkedTree {
    pub root: TreeNode,
    pub files: Vec<FileEntry>,
    pub totals: WalkTotals,
}

/// Walk a directory into a TreeNode tree with flat file entries and totals.
///
/// The caller guarantees `root` is an existing directory.
pub fn walk(root: &Path, config: &ScanConfig) -> WalkedTree {
    let excluded: HashSet<&str> = config.exclude.iter().map(String::as_str).collect();
    let include_hidden = config.include_hidden;
    let max_depth = config.max_depth.unwrap_or(usize::MAX);

    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by(compare_entries)
        .into_iter()
        .filter_entry(|entry| {
            // The root is never filtered, whatever its name
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if excluded.contains(name.as_ref()) {
                debug!("excluding {}", entry.path().display());
                return false;
            }
            if !include_hidden && name.starts_with('.') {
                return false;
            }
            true
        });

    let mut files = Vec::new();
    let mut totals = WalkTotals::default();
    // Open directories by depth; nodes are attached to their parent when
    // the walk moves back up
    let mut stack: Vec<TreeNode> = Vec::new();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("cannot read {}: {}", describe_error_path(&e), e);
                continue;
            }
        };

        let depth = entry.depth();
        while stack.len() > depth {
            if let Some(done) = stack.pop() {
                match stack.last_mut() {
                    Some(parent) => parent.children.push(done),
                    None => {
                        // Only the root can empty the stack; put it back
                        stack.push(done);
                        break;
                    }
                }
            }
        }

        let name = if depth == 0 {
            root.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| root.display().to_string())
        } else {
            entry.file_name().to_string_lossy().to_string()
        };
        let rel_path = relative_path(entry.path(), root);

        if entry.file_type().is_dir() {
            totals.directories += 1;
            stack.push(TreeNode::directory(name, rel_path, depth));
        } else {
            totals.files += 1;
            let stats = file_stats(entry.path());
            totals.lines += stats.lines.total;
            *totals.by_extension.entry(stats.extension.clone()).or_insert(0) += 1;

            files.push(FileEntry {
                rel_path: rel_path.clone(),
                abs_path: entry.path().to_path_buf(),
                extension: stats.extension.clone(),
            });

            let node = TreeNode::file(name, rel_path, depth, stats);
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                // Root itself is a file only when the caller broke the
                // contract; keep it as a degenerate tree
                None => stack.push(node),
            }
        }
    }

    while stack.len() > 1 {
        if let Some(done) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(done);
            }
        }
    }

    let root_node = stack
        .pop()
        .unwrap_or_else(|| TreeNode::directory(String::new(), String::new(), 0));

    WalkedTree {
        root: root_node,
        files,
        totals,
    }
}

/// Sibling ordering: directories first, then case-insensitive by name
fn compare_entries(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_key = (
        !a.file_type().is_dir(),
        a.file_name().to_string_lossy().to_lowercase(),
    );
    let b_key = (
        !b.file_type().is_dir(),
        b.file_name().to_string_lossy().to_lowercase(),
    );
    a_key.cmp(&b_key)
}

/// '/'-separated path relative to the scan root; empty for the root itself
fn relative_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn describe_error_path(e: &walkdir::Error) -> String {
    e.path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// Compute size, encoding and line counts for a single file.
///
/// Never fails: an unreadable or undecodable file records zero counts and
/// Encoding::Unknown.
pub fn file_stats(path: &Path) -> FileStats {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("could not read {}: {}", path.display(), e);
            return FileStats {
                extension,
                size: 0,
                lines: LineCounts::default(),
                encoding: Encoding::Unknown,
            };
        }
    };
    let size = bytes.len() as u64;

    let (content, encoding) = match decode(&bytes) {
        Some(decoded) => decoded,
        None => {
            debug!("no encoding decodes {}", path.display());
            return FileStats {
                extension,
                size,
                lines: LineCounts::default(),
                encoding: Encoding::Unknown,
            };
        }
    };

    let lines = count_lines(&content, extension == "py");

    FileStats {
        extension,
        size,
        lines,
        encoding,
    }
}

/// Decode bytes by trying encodings in priority order: utf-8, then latin-1.
/// Content with NUL bytes is treated as binary and decodes under neither.
pub(crate) fn decode(bytes: &[u8]) -> Option<(String, Encoding)> {
    if bytes.contains(&0) {
        return None;
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Some((s.to_string(), Encoding::Utf8)),
        Err(_) => {
            let s: String = bytes.iter().map(|&b| b as char).collect();
            Some((s, Encoding::Latin1))
        }
    }
}

/// Count lines; the blank/comment/code breakdown applies to source files
/// only, other text files record totals
fn count_lines(content: &str, is_source: bool) -> LineCounts {
    let mut counts = LineCounts::default();
    if content.is_empty() {
        return counts;
    }

    for line in content.split('\n') {
        counts.total += 1;
        if is_source {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                counts.blank += 1;
            } else if trimmed.starts_with('#') {
                counts.comment += 1;
            } else {
                counts.code += 1;
            }
        }
    }

    counts
}
