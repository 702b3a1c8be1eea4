// Per-file declarative-structure extraction

pub mod ast;
pub mod python;

pub use ast::*;
pub use python::PythonParser;

use crate::error::Result;

/// A language-specific source parser.
///
/// The pipeline depends only on this capability; `PythonParser` is the one
/// shipped implementation. Adding a language means adding an implementation,
/// not touching the pipeline.
pub trait SourceParser {
    /// Whether this parser handles files with the given extension
    fn handles(&self, extension: &str) -> bool;

    /// Parse source text into a module record. Fails on syntax errors; the
    /// caller decides whether that skips the file or aborts.
    fn parse_source(&mut self, source: &str, module_path: &str) -> Result<ModuleRecord>;
}
