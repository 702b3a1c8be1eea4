// Record types for extracted module structure
//
// These represent the declarative structure recovered from one source file.
// They are serializable so the CLI can emit the whole model as JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything extracted from one parseable source file.
///
/// Created once per successfully parsed file and immutable afterwards. A
/// file that fails to parse produces no record at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleRecord {
    /// File path relative to project root, '/'-separated
    pub path: String,
    /// Module-level docstring
    pub docstring: Option<String>,
    /// Classes defined at module level
    pub classes: Vec<ClassRecord>,
    /// Functions not lexically contained in any class body
    pub functions: Vec<FunctionRecord>,
    /// All imports in the file
    pub imports: Vec<ImportRecord>,
    /// Module-level ALL_CAPS assignments
    pub constants: Vec<ConstantRecord>,
    /// Sum of the cyclomatic complexity of every function body in the
    /// file, methods and nested functions included
    pub complexity: u32,
    /// Raw top-level dependency identifiers referenced by imports
    pub dependencies: BTreeSet<String>,
}

impl ModuleRecord {
    /// Create an empty record for the given module path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            docstring: None,
            classes: Vec::new(),
            functions: Vec::new(),
            imports: Vec::new(),
            constants: Vec::new(),
            complexity: 0,
            dependencies: BTreeSet::new(),
        }
    }

    /// Check if the record has any declarations
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.functions.is_empty() && self.constants.is_empty()
    }

    /// The path with separators replaced by dots and the extension stripped,
    /// used by the dependency resolver for textual matching
    pub fn dotted_path(&self) -> String {
        dotted(&self.path)
    }
}

/// Dot-normalize a '/'-separated module path
pub fn dotted(path: &str) -> String {
    let trimmed = path.strip_suffix(".py").unwrap_or(path);
    trimmed.replace('/', ".")
}

/// A class definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassRecord {
    /// Class name
    pub name: String,
    /// Methods from the class's immediate body
    pub methods: Vec<MethodRecord>,
    /// Base classes as written, not resolved
    pub bases: Vec<String>,
    /// Decorator names without arguments
    pub decorators: Vec<String>,
    /// Class docstring
    pub docstring: Option<String>,
    /// Declaration line number (1-based)
    pub line: usize,
    /// Whether any base name textually references an abstract-base marker
    pub is_abstract: bool,
}

impl ClassRecord {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            methods: Vec::new(),
            bases: Vec::new(),
            decorators: Vec::new(),
            docstring: None,
            line,
            is_abstract: false,
        }
    }

    /// Get public methods (not starting with _)
    pub fn public_methods(&self) -> impl Iterator<Item = &MethodRecord> {
        self.methods.iter().filter(|m| !m.name.starts_with('_'))
    }
}

/// A method from a class's immediate body.
///
/// Methods carry declaration metadata only; no per-method docstring or
/// complexity is recorded, though method bodies still count toward the
/// module's complexity total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodRecord {
    /// Method name
    pub name: String,
    /// Ordered parameter names
    pub params: Vec<String>,
    /// Return annotation as written
    pub returns: Option<String>,
    /// Decorator names without arguments
    pub decorators: Vec<String>,
    /// @property or a .getter decorator
    pub is_property: bool,
    /// @staticmethod
    pub is_static: bool,
    /// @classmethod
    pub is_classmethod: bool,
    /// Declaration line number (1-based)
    pub line: usize,
}

impl MethodRecord {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            returns: None,
            decorators: Vec::new(),
            is_property: false,
            is_static: false,
            is_classmethod: false,
            line,
        }
    }

    /// Derive the flag fields from the decorator list
    pub fn apply_decorators(&mut self) {
        self.is_property = self
            .decorators
            .iter()
            .any(|d| d == "property" || d.ends_with(".getter"));
        self.is_static = self.decorators.iter().any(|d| d == "staticmethod");
        self.is_classmethod = self.decorators.iter().any(|d| d == "classmethod");
    }

    /// Check if this is a special method (__x__)
    pub fn is_special(&self) -> bool {
        self.name.starts_with("__") && self.name.ends_with("__")
    }
}

/// A module-level function definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionRecord {
    /// Function name
    pub name: String,
    /// Ordered parameter names
    pub params: Vec<String>,
    /// Return annotation as written
    pub returns: Option<String>,
    /// Decorator names without arguments
    pub decorators: Vec<String>,
    /// Function docstring
    pub docstring: Option<String>,
    /// async def
    pub is_async: bool,
    /// Declaration line number (1-based)
    pub line: usize,
    /// Cyclomatic complexity, always at least 1
    pub complexity: u32,
}

impl FunctionRecord {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            returns: None,
            decorators: Vec::new(),
            docstring: None,
            is_async: false,
            line,
            complexity: 1,
        }
    }

    /// Check if this is a private function (starts with a single _)
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_') && !self.name.starts_with("__")
    }
}

/// An import statement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportRecord {
    /// The raw module identifier as written
    pub module: String,
    /// Alias from an `as` clause (direct imports)
    pub alias: Option<String>,
    /// Imported names (from-style imports)
    pub names: Vec<String>,
    /// Import kind
    pub kind: ImportKind,
    /// Declaration line number (1-based)
    pub line: usize,
}

impl ImportRecord {
    /// Create an `import x` style record
    pub fn direct(module: &str, alias: Option<String>, line: usize) -> Self {
        Self {
            module: module.to_string(),
            alias,
            names: Vec::new(),
            kind: ImportKind::Direct,
            line,
        }
    }

    /// Create a `from x import y` style record
    pub fn from_import(module: &str, names: Vec<String>, line: usize) -> Self {
        Self {
            module: module.to_string(),
            alias: None,
            names,
            kind: ImportKind::From,
            line,
        }
    }

    /// The top-level component of the imported path, used as the dependency
    /// identifier for graph resolution
    pub fn dependency_identifier(&self) -> &str {
        self.module.split('.').next().unwrap_or(&self.module)
    }
}

/// Kind of import statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// `import x` or `import x as y`
    Direct,
    /// `from x import y`
    From,
}

/// A module-level constant (ALL_CAPS assignment)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConstantRecord {
    /// Constant name
    pub name: String,
    /// Assigned value as written, when recoverable
    pub value: Option<String>,
    /// Declaration line number (1-based)
    pub line: usize,
}

impl ConstantRecord {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            value: None,
            line,
        }
    }
}
