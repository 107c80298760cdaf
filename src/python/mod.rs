//! Python source analysis built on tree-sitter-python.
//!
//! A parsed module yields three things: the module docstring, the symbol
//! table (functions, classes, methods, fields, module bindings), and the
//! marker comments attributed to their owning definitions.

pub mod comments;
pub mod docstring;
pub mod symbols;

use std::path::Path;

use crate::error::CodeScoutError;

pub use comments::OwnedMarker;
pub use docstring::Docstring;
pub use symbols::{Symbol, SymbolKind};

/// Everything extracted from one Python module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleReport {
    pub docstring: Option<Docstring>,
    pub symbols: Vec<Symbol>,
    pub markers: Vec<OwnedMarker>,
}

/// Analyzer owning a reusable tree-sitter parser.
pub struct PythonAnalyzer {
    parser: tree_sitter::Parser,
}

impl PythonAnalyzer {
    pub fn new() -> Result<Self, CodeScoutError> {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
        Ok(Self { parser })
    }

    /// Parse `source` and extract the module report. Same input always
    /// produces the same report; no IO happens here.
    pub fn analyze(
        &mut self,
        file_label: &str,
        source: &str,
    ) -> Result<ModuleReport, CodeScoutError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| CodeScoutError::Parse(file_label.to_string()))?;

        let root = tree.root_node();
        let src = source.as_bytes();

        let docstring = docstring::module_docstring(&root, src);
        let symbols = symbols::extract(&root, src);
        let markers = comments::collect(&root, source, &symbols);

        Ok(ModuleReport {
            docstring,
            symbols,
            markers,
        })
    }
}

/// Only `.py` files go through the tree-sitter pipeline.
pub fn is_python_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("py")
}
