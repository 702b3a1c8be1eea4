// Python declaration extractor using tree-sitter

use crate::error::{Error, Result};
use crate::parser::ast::*;
use crate::parser::SourceParser;
use tree_sitter::{Node, Parser};

/// Extracts the declarative structure of Python source files
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::parser(format!("Failed to set Python language: {}", e)))?;
        Ok(Self { parser })
    }
}

impl SourceParser for PythonParser {
    fn handles(&self, extension: &str) -> bool {
        extension == "py"
    }

    fn parse_source(&mut self, source: &str, module_path: &str) -> Result<ModuleRecord> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::parser("Failed to parse source"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(Error::parse(module_path, "syntax error"));
        }

        let mut record = ModuleRecord::new(module_path);
        record.docstring = extract_docstring(&root, source.as_bytes());

        collect(&root, source.as_bytes(), &mut record, false, true);

        for import in &record.imports {
            record
                .dependencies
                .insert(import.dependency_identifier().to_string());
        }
        record.complexity = module_complexity(&root);

        Ok(record)
    }
}

/// Walk the tree classifying declarations.
///
/// `in_class` is true while inside any class body: functions there are
/// either methods (captured separately from the class's immediate body) or
/// nested declarations that are not recorded. Functions nested inside other
/// functions are folded into the module-level list, a known quirk kept as
/// documented behavior. `top_level` is true only for direct children of the
/// module, which is where constants are collected.
fn collect(node: &Node, source: &[u8], record: &mut ModuleRecord, in_class: bool, top_level: bool) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_statement" => {
                record.imports.extend(parse_import(&child, source));
            }
            "import_from_statement" => {
                if let Some(import) = parse_import_from(&child, source) {
                    record.imports.push(import);
                }
            }
            "class_definition" => {
                if let Some(class) = parse_class(&child, source, Vec::new()) {
                    record.classes.push(class);
                }
                if let Some(body) = child.child_by_field_name("body") {
                    collect(&body, source, record, true, false);
                }
            }
            "function_definition" => {
                if !in_class {
                    if let Some(func) = parse_function(&child, source, Vec::new()) {
                        record.functions.push(func);
                    }
                }
                if let Some(body) = child.child_by_field_name("body") {
                    collect(&body, source, record, in_class, false);
                }
            }
            "decorated_definition" => {
                let decorators = extract_decorators(&child, source);
                let mut inner_cursor = child.walk();
                for inner in child.children(&mut inner_cursor) {
                    match inner.kind() {
                        "class_definition" => {
                            if let Some(class) = parse_class(&inner, source, decorators.clone()) {
                                record.classes.push(class);
                            }
                            if let Some(body) = inner.child_by_field_name("body") {
                                collect(&body, source, record, true, false);
                            }
                        }
                        "function_definition" => {
                            if !in_class {
                                if let Some(func) =
                                    parse_function(&inner, source, decorators.clone())
                                {
                                    record.functions.push(func);
                                }
                            }
                            if let Some(body) = inner.child_by_field_name("body") {
                                collect(&body, source, record, in_class, false);
                            }
                        }
                        _ => {}
                    }
                }
            }
            "expression_statement" => {
                if top_level {
                    if let Some(constant) = parse_constant(&child, source) {
                        record.constants.push(constant);
                    }
                }
            }
            _ => {
                collect(&child, source, record, in_class, false);
            }
        }
    }
}

/// Cyclomatic complexity of a function subtree.
///
/// Starts at 1; each branching construct adds 1. Boolean operator chains
/// are nested binary nodes in the grammar, so counting each node yields
/// operand_count - 1 for a chain.
pub fn complexity(node: &Node) -> u32 {
    let mut score = 1;
    let mut stack = vec![*node];

    while let Some(current) = stack.pop() {
        let mut cursor = current.walk();
        for child in current.children(&mut cursor) {
            match child.kind() {
                "if_statement" | "elif_clause" | "while_statement" | "for_statement"
                | "except_clause" | "boolean_operator" => score += 1,
                _ => {}
            }
            stack.push(child);
        }
    }

    score
}

/// Total complexity of every function in the file. Each function_definition
/// subtree is scored independently, so methods count and a nested function's
/// branches also contribute to its enclosing function's score.
fn module_complexity(root: &Node) -> u32 {
    let mut total = 0;
    let mut stack = vec![*root];

    while let Some(current) = stack.pop() {
        let mut cursor = current.walk();
        for child in current.children(&mut cursor) {
            if child.kind() == "function_definition" {
                total += complexity(&child);
            }
            stack.push(child);
        }
    }

    total
}

/// Extract the docstring from a block or module node (leading string
/// expression, allowing comments before it)
fn extract_docstring(node: &Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "expression_statement" {
            let mut inner_cursor = child.walk();
            for inner in child.children(&mut inner_cursor) {
                if inner.kind() == "string" {
                    return string_content(&inner, source);
                }
            }
            return None;
        } else if child.kind() != "comment" {
            return None;
        }
    }
    None
}

/// Strip quotes from a string literal node
fn string_content(node: &Node, source: &[u8]) -> Option<String> {
    let text = node.utf8_text(source).ok()?;

    let s = if text.starts_with("\"\"\"") || text.starts_with("'''") {
        &text[3..text.len().saturating_sub(3)]
    } else if text.starts_with('"') || text.starts_with('\'') {
        &text[1..text.len().saturating_sub(1)]
    } else {
        text
    };

    Some(s.trim().to_string())
}

/// Parse `import x` / `import x as y` / `import x, z`; one record per name
fn parse_import(node: &Node, source: &[u8]) -> Vec<ImportRecord> {
    let line = node.start_position().row + 1;
    let mut records = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                if let Ok(name) = child.utf8_text(source) {
                    records.push(ImportRecord::direct(name, None, line));
                }
            }
            "aliased_import" => {
                let mut name = None;
                let mut alias = None;
                let mut inner_cursor = child.walk();
                for inner in child.children(&mut inner_cursor) {
                    match inner.kind() {
                        "dotted_name" => name = inner.utf8_text(source).ok(),
                        "identifier" => alias = inner.utf8_text(source).ok(),
                        _ => {}
                    }
                }
                if let Some(name) = name {
                    records.push(ImportRecord::direct(
                        name,
                        alias.map(str::to_string),
                        line,
                    ));
                }
            }
            _ => {}
        }
    }

    records
}

/// Parse `from x import y, z`. Pure relative imports (`from . import x`)
/// carry no module identifier and are skipped.
fn parse_import_from(node: &Node, source: &[u8]) -> Option<ImportRecord> {
    let line = node.start_position().row + 1;
    let mut module = String::new();
    let mut names = Vec::new();
    let mut seen_import_keyword = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "relative_import" => {
                let mut inner_cursor = child.walk();
                for inner in child.children(&mut inner_cursor) {
                    if inner.kind() == "dotted_name" {
                        module = inner.utf8_text(source).ok()?.to_string();
                    }
                }
            }
            "dotted_name" => {
                let text = child.utf8_text(source).ok()?;
                if seen_import_keyword {
                    names.push(text.to_string());
                } else {
                    module = text.to_string();
                }
            }
            "import" => seen_import_keyword = true,
            "wildcard_import" => names.push("*".to_string()),
            "aliased_import" => {
                let mut inner_cursor = child.walk();
                for inner in child.children(&mut inner_cursor) {
                    if matches!(inner.kind(), "identifier" | "dotted_name") {
                        names.push(inner.utf8_text(source).ok()?.to_string());
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    if module.is_empty() {
        return None;
    }

    Some(ImportRecord::from_import(&module, names, line))
}

/// Parse a class definition; methods come from the immediate body only
fn parse_class(node: &Node, source: &[u8], decorators: Vec<String>) -> Option<ClassRecord> {
    let line = node.start_position().row + 1;
    let mut name = String::new();
    let mut bases = Vec::new();
    let mut docstring = None;
    let mut methods = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                if name.is_empty() {
                    name = child.utf8_text(source).ok()?.to_string();
                }
            }
            "argument_list" => {
                bases = extract_bases(&child, source);
            }
            "block" => {
                docstring = extract_docstring(&child, source);
                methods = parse_methods(&child, source);
            }
            _ => {}
        }
    }

    if name.is_empty() {
        return None;
    }

    let is_abstract = bases.iter().any(|b| b.contains("ABC"));

    Some(ClassRecord {
        name,
        methods,
        bases,
        decorators,
        docstring,
        line,
        is_abstract,
    })
}

/// Extract base class names from a class argument list
fn extract_bases(node: &Node, source: &[u8]) -> Vec<String> {
    let mut bases = Vec::new();
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" | "attribute" | "subscript" => {
                if let Ok(text) = child.utf8_text(source) {
                    bases.push(text.to_string());
                }
            }
            _ => {}
        }
    }

    bases
}

/// Collect methods from a class's immediate body
fn parse_methods(body: &Node, source: &[u8]) -> Vec<MethodRecord> {
    let mut methods = Vec::new();
    let mut cursor = body.walk();

    for child in body.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                if let Some(method) = parse_method(&child, source, Vec::new()) {
                    methods.push(method);
                }
            }
            "decorated_definition" => {
                let decorators = extract_decorators(&child, source);
                let mut inner_cursor = child.walk();
                for inner in child.children(&mut inner_cursor) {
                    if inner.kind() == "function_definition" {
                        if let Some(method) = parse_method(&inner, source, decorators.clone()) {
                            methods.push(method);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    methods
}

/// Parse one method from a function_definition node
fn parse_method(node: &Node, source: &[u8], decorators: Vec<String>) -> Option<MethodRecord> {
    let line = node.start_position().row + 1;
    let (name, params, returns) = parse_signature(node, source)?;

    let mut method = MethodRecord {
        name,
        params,
        returns,
        decorators,
        is_property: false,
        is_static: false,
        is_classmethod: false,
        line,
    };
    method.apply_decorators();
    Some(method)
}

/// Parse one module-level function from a function_definition node
fn parse_function(node: &Node, source: &[u8], decorators: Vec<String>) -> Option<FunctionRecord> {
    let line = node.start_position().row + 1;
    let (name, params, returns) = parse_signature(node, source)?;

    let mut cursor = node.walk();
    let is_async = node.children(&mut cursor).any(|c| c.kind() == "async");

    let docstring = node
        .child_by_field_name("body")
        .and_then(|body| extract_docstring(&body, source));

    Some(FunctionRecord {
        name,
        params,
        returns,
        decorators,
        docstring,
        is_async,
        line,
        complexity: complexity(node),
    })
}

/// Extract (name, parameter names, return annotation) from a
/// function_definition node
fn parse_signature(node: &Node, source: &[u8]) -> Option<(String, Vec<String>, Option<String>)> {
    let mut name = String::new();
    let mut params = Vec::new();
    let mut returns = None;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                if name.is_empty() {
                    name = child.utf8_text(source).ok()?.to_string();
                }
            }
            "parameters" => {
                params = parse_parameter_names(&child, source);
            }
            "type" => {
                returns = Some(child.utf8_text(source).ok()?.to_string());
            }
            _ => {}
        }
    }

    if name.is_empty() {
        return None;
    }
    Some((name, params, returns))
}

/// Ordered parameter names from a parameters node
fn parse_parameter_names(node: &Node, source: &[u8]) -> Vec<String> {
    let mut params = Vec::new();
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                if let Ok(text) = child.utf8_text(source) {
                    params.push(text.to_string());
                }
            }
            "typed_parameter"
            | "default_parameter"
            | "typed_default_parameter"
            | "list_splat_pattern"
            | "dictionary_splat_pattern" => {
                if let Some(name) = first_identifier(&child, source) {
                    params.push(name);
                }
            }
            _ => {}
        }
    }

    params
}

/// The first identifier inside a parameter node
fn first_identifier(node: &Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "identifier" {
            return child.utf8_text(source).ok().map(str::to_string);
        }
    }
    None
}

/// Decorator names from a decorated_definition, @ and arguments stripped
fn extract_decorators(node: &Node, source: &[u8]) -> Vec<String> {
    let mut decorators = Vec::new();
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        if child.kind() == "decorator" {
            if let Ok(text) = child.utf8_text(source) {
                let dec = text.trim_start_matches('@');
                let dec = match dec.find('(') {
                    Some(idx) => &dec[..idx],
                    None => dec,
                };
                decorators.push(dec.trim().to_string());
            }
        }
    }

    decorators
}

/// Parse a module-level ALL_CAPS assignment into a constant
fn parse_constant(node: &Node, source: &[u8]) -> Option<ConstantRecord> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "assignment" {
            let line = child.start_position().row + 1;
            let mut name = None;
            let mut value = None;

            let mut inner_cursor = child.walk();
            for inner in child.children(&mut inner_cursor) {
                match inner.kind() {
                    "identifier" => {
                        let n = inner.utf8_text(source).ok()?;
                        if name.is_none() && is_constant_name(n) {
                            name = Some(n.to_string());
                        }
                    }
                    "=" | ":" | "type" => {}
                    _ => {
                        if name.is_some() && value.is_none() {
                            value = inner.utf8_text(source).ok().map(str::to_string);
                        }
                    }
                }
            }

            if let Some(name) = name {
                return Some(ConstantRecord { name, value, line });
            }
        }
    }
    None
}

/// An entirely upper-case identifier (underscores and digits allowed)
fn is_constant_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == '_' || c.is_ascii_digit())
}
