// Integration tests for codemap

use codemap::config::Config;
use codemap::scanner::{scan, Scanner};
use codemap::Error;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &TempDir, rel: &str, content: &str) {
    let path = dir.path().join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write fixture file");
}

/// A small project with one import edge and one non-trivial function
fn two_module_project() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    write(
        &dir,
        "a.py",
        "import b\n\ndef f(items):\n    if items:\n        for item in items:\n            print(item)\n",
    );
    write(&dir, "b.py", "VALUE = 42\n");
    dir
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[test]
fn test_scan_two_module_project() {
    let dir = two_module_project();

    let model = scan(dir.path(), None, &[], false).expect("scan failed");

    assert_eq!(model.modules.len(), 2);
    assert!(model.graph.contains_edge("a.py", "b.py"));
    assert_eq!(model.metrics.entry_points, vec!["a.py"]);
    assert_eq!(model.metrics.leaf_modules, vec!["b.py"]);
    assert!(model.metrics.is_acyclic);

    // complexity: base 1 + if + for
    let f = &model.modules["a.py"].functions[0];
    assert_eq!(f.name, "f");
    assert_eq!(f.complexity, 3);
}

#[test]
fn test_scan_invalid_root() {
    let err = scan(Path::new("/definitely/not/here"), None, &[], false).unwrap_err();
    assert!(matches!(err, Error::InvalidRoot(_)));

    let dir = TempDir::new().expect("create temp dir");
    write(&dir, "lone.py", "x = 1\n");
    let err = scan(&dir.path().join("lone.py"), None, &[], false).unwrap_err();
    assert!(matches!(err, Error::InvalidRoot(_)));
}

#[test]
fn test_scan_extracts_declarations() {
    let dir = TempDir::new().expect("create temp dir");
    write(
        &dir,
        "models.py",
        r#""""Domain models."""

from abc import ABC

MAX_RETRIES = 3


class Base(ABC):
    """Common persistence hooks."""

    def save(self):
        pass


class User(Base):
    def __init__(self, name):
        self.name = name

    @property
    def display_name(self):
        return self.name.title()


async def load_user(user_id):
    """Fetch a user by id."""
    return None
"#,
    );

    let model = scan(dir.path(), None, &[], false).expect("scan failed");
    let module = model.module("models.py").expect("module present");

    assert_eq!(module.docstring.as_deref(), Some("Domain models."));
    assert_eq!(module.constants.len(), 1);
    assert_eq!(module.constants[0].name, "MAX_RETRIES");

    assert_eq!(module.classes.len(), 2);
    let base = &module.classes[0];
    assert_eq!(base.name, "Base");
    assert!(base.is_abstract);
    let user = &module.classes[1];
    assert_eq!(user.name, "User");
    assert_eq!(user.bases, vec!["Base"]);
    assert!(user.methods.iter().any(|m| m.is_property));

    assert_eq!(module.functions.len(), 1);
    assert!(module.functions[0].is_async);
    assert_eq!(
        module.functions[0].docstring.as_deref(),
        Some("Fetch a user by id.")
    );
}

#[test]
fn test_scan_skips_unparseable_file() {
    let dir = TempDir::new().expect("create temp dir");
    write(&dir, "ok.py", "x = 1\n");
    write(&dir, "broken.py", "class Oops(:\n");

    let model = scan(dir.path(), None, &[], false).expect("scan failed");

    // The broken file is counted in the tree but produces no module
    assert_eq!(model.stats.total_files, 2);
    assert_eq!(model.stats.skipped_files, 1);
    assert_eq!(model.modules.len(), 1);
    assert!(model
        .tree
        .children
        .iter()
        .any(|n| n.name == "broken.py"));
}

#[test]
fn test_scan_undecodable_file_stays_in_tree() {
    use codemap::scanner::tree::Encoding;

    let dir = TempDir::new().expect("create temp dir");
    write(&dir, "ok.py", "x = 1\n");
    fs::write(dir.path().join("blob.py"), [0u8, 159, 146, 150]).expect("write binary file");

    let model = scan(dir.path(), None, &[], false).expect("scan failed");

    // The binary file yields no module but is counted as skipped
    assert_eq!(model.stats.total_files, 2);
    assert_eq!(model.stats.source_files, 2);
    assert_eq!(model.stats.skipped_files, 1);
    assert_eq!(model.modules.len(), 1);
    assert!(model.modules.contains_key("ok.py"));

    // It still appears in the tree with its size and zero line counts
    let node = model
        .tree
        .children
        .iter()
        .find(|n| n.name == "blob.py")
        .expect("binary file present in tree");
    let stats = node.file.as_ref().expect("file stats recorded");
    assert_eq!(stats.size, 4);
    assert_eq!(stats.lines.total, 0);
    assert_eq!(stats.encoding, Encoding::Unknown);
}

#[test]
fn test_scan_excluded_directories() {
    let dir = TempDir::new().expect("create temp dir");
    write(&dir, "main.py", "import helper\n");
    write(&dir, "__pycache__/helper.py", "x = 1\n");
    write(&dir, "node_modules/helper.py", "x = 1\n");

    let model = scan(dir.path(), None, &[], false).expect("scan failed");

    assert_eq!(model.modules.len(), 1);
    assert!(model.dependencies["main.py"].is_empty());
    assert_eq!(model.metrics.edge_count, 0);
}

#[test]
fn test_scan_custom_exclude_list() {
    let dir = TempDir::new().expect("create temp dir");
    write(&dir, "keep.py", "x = 1\n");
    write(&dir, "generated/skip.py", "y = 2\n");

    let exclude = vec!["generated".to_string()];
    let model = scan(dir.path(), None, &exclude, false).expect("scan failed");

    assert!(model.modules.contains_key("keep.py"));
    assert!(!model.modules.contains_key("generated/skip.py"));
}

#[test]
fn test_scan_max_depth() {
    let dir = TempDir::new().expect("create temp dir");
    write(&dir, "top.py", "x = 1\n");
    write(&dir, "pkg/mid.py", "y = 2\n");
    write(&dir, "pkg/sub/deep.py", "z = 3\n");

    let model = scan(dir.path(), Some(2), &[], false).expect("scan failed");

    assert!(model.modules.contains_key("top.py"));
    assert!(model.modules.contains_key("pkg/mid.py"));
    assert!(!model.modules.contains_key("pkg/sub/deep.py"));
}

#[test]
fn test_scan_hidden_files() {
    let dir = TempDir::new().expect("create temp dir");
    write(&dir, "shown.py", "x = 1\n");
    write(&dir, ".secret.py", "y = 2\n");

    let without = scan(dir.path(), None, &[], false).expect("scan failed");
    assert_eq!(without.modules.len(), 1);

    let with = scan(dir.path(), None, &[], true).expect("scan failed");
    assert_eq!(with.modules.len(), 2);
}

#[test]
fn test_scan_dependency_cycle_detected() {
    let dir = TempDir::new().expect("create temp dir");
    write(&dir, "alpha.py", "import beta\n");
    write(&dir, "beta.py", "import alpha\n");

    let model = scan(dir.path(), None, &[], false).expect("scan failed");

    assert!(!model.metrics.is_acyclic);
    assert!(model.metrics.entry_points.is_empty());
    assert!(model.metrics.leaf_modules.is_empty());
}

#[test]
fn test_scan_ambiguous_identifier_keeps_all_matches() {
    let dir = TempDir::new().expect("create temp dir");
    write(&dir, "app/common.py", "A = 1\n");
    write(&dir, "lib/common.py", "B = 2\n");
    write(&dir, "main.py", "import common\n");

    let model = scan(dir.path(), None, &[], false).expect("scan failed");

    // The dependency map records every match; the graph keeps only the first
    assert_eq!(
        model.dependencies["main.py"],
        vec!["app/common.py".to_string(), "lib/common.py".to_string()]
    );
    assert!(model.graph.contains_edge("main.py", "app/common.py"));
    assert!(!model.graph.contains_edge("main.py", "lib/common.py"));
}

#[test]
fn test_scan_hierarchy_clusters() {
    let dir = TempDir::new().expect("create temp dir");
    write(&dir, "cli.py", "");
    write(&dir, "core/engine.py", "");
    write(&dir, "core/state.py", "");

    let model = scan(dir.path(), None, &[], false).expect("scan failed");

    assert_eq!(model.hierarchy["root"], vec!["cli.py"]);
    assert_eq!(
        model.hierarchy["core"],
        vec!["core/engine.py", "core/state.py"]
    );
}

#[test]
fn test_scan_deterministic_across_runs() {
    let dir = two_module_project();

    let first = scan(dir.path(), None, &[], false).expect("scan failed");
    let second = scan(dir.path(), None, &[], false).expect("scan failed");

    assert_eq!(
        serde_json::to_value(&first).expect("serialize"),
        serde_json::to_value(&second).expect("serialize")
    );
}

#[test]
fn test_scanner_rejects_invalid_config() {
    let mut config = Config::default();
    config.scan.max_depth = Some(0);
    assert!(Scanner::new(config).is_err());
}

#[test]
fn test_json_model_shape() {
    let dir = two_module_project();
    let model = scan(dir.path(), None, &[], false).expect("scan failed");

    let json = serde_json::to_value(&model).expect("serialize model");

    assert_eq!(json["name"], model.name);
    assert_eq!(json["stats"]["total_files"], 2);
    assert_eq!(json["modules"]["a.py"]["imports"][0]["module"], "b");
    assert_eq!(json["graph"]["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(json["metrics"]["is_acyclic"], true);
    assert_eq!(json["tree"]["kind"], "directory");
}

// ============================================================================
// CLI Tests
// ============================================================================

mod cli {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;

    #[test]
    fn test_scan_summary_output() {
        let dir = two_module_project();

        Command::cargo_bin("codemap")
            .expect("binary built")
            .arg("scan")
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Scan complete"))
            .stdout(predicate::str::contains("Entry points:"))
            .stdout(predicate::str::contains("a.py"));
    }

    #[test]
    fn test_scan_json_output() {
        let dir = two_module_project();
        let out = TempDir::new().expect("create temp dir");

        Command::cargo_bin("codemap")
            .expect("binary built")
            .arg("scan")
            .arg(dir.path())
            .arg("--format")
            .arg("json")
            .arg("--output")
            .arg(out.path())
            .assert()
            .success();

        let json_path = out.path().join("codemap.json");
        let contents = fs::read_to_string(json_path).expect("json written");
        let value: serde_json::Value = serde_json::from_str(&contents).expect("valid json");
        assert_eq!(value["metrics"]["node_count"], 2);
    }

    #[test]
    fn test_scan_missing_path_fails() {
        Command::cargo_bin("codemap")
            .expect("binary built")
            .arg("scan")
            .arg("/definitely/not/here")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid scan root"));
    }

    #[test]
    fn test_version_command() {
        Command::cargo_bin("codemap")
            .expect("binary built")
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("codemap"));
    }
}
