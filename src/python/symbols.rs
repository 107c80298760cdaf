//! Symbol enumeration over the tree-sitter CST.
//!
//! The walk covers `def` / `async def`, classes (with base classes), methods
//! and `@property` methods, class fields, and module-level bindings
//! (UPPER_SNAKE_CASE constants, annotated variables, lambdas, and
//! comprehension results). Definitions nested inside compound statements
//! (`if`, `try`, ...) are still discovered.

use tree_sitter::Node;

use crate::python::docstring::{self, Docstring};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Property,
    Field,
    Constant,
    Variable,
    Lambda,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Property => "property",
            SymbolKind::Field => "field",
            SymbolKind::Constant => "constant",
            SymbolKind::Variable => "variable",
            SymbolKind::Lambda => "lambda",
        }
    }
}

/// One parameter of a function or method.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<String>,
    pub default: Option<String>,
}

/// A symbol extracted from a Python module.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    /// Dotted path including the enclosing class, e.g. `User.validate`
    pub qualified_name: String,
    pub kind: SymbolKind,
    /// Qualified name of the enclosing class, if any
    pub parent: Option<String>,
    /// 1-indexed, decorators included in the span
    pub start_line: usize,
    pub end_line: usize,
    pub is_async: bool,
    /// Base-class names for classes
    pub bases: Vec<String>,
    /// Decorator names without the leading `@`
    pub decorators: Vec<String>,
    pub params: Vec<Param>,
    pub return_annotation: Option<String>,
    /// Type annotation for bindings (fields, variables)
    pub annotation: Option<String>,
    /// Right-hand side text for bindings, verbatim
    pub value: Option<String>,
    pub docstring: Option<Docstring>,
}

impl Symbol {
    /// Definitions are the symbols marker comments can be attributed to.
    pub fn is_definition(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Class | SymbolKind::Property
        )
    }

    /// Human-readable one-line signature.
    pub fn signature(&self) -> String {
        match self.kind {
            SymbolKind::Class => {
                if self.bases.is_empty() {
                    format!("class {}", self.name)
                } else {
                    format!("class {}({})", self.name, self.bases.join(", "))
                }
            }
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Property => {
                let params: Vec<String> = self.params.iter().map(render_param).collect();
                let ret = self
                    .return_annotation
                    .as_deref()
                    .map(|r| format!(" -> {r}"))
                    .unwrap_or_default();
                let prefix = if self.is_async { "async def" } else { "def" };
                format!("{} {}({}){}", prefix, self.name, params.join(", "), ret)
            }
            SymbolKind::Field | SymbolKind::Constant | SymbolKind::Variable | SymbolKind::Lambda => {
                let mut s = self.name.clone();
                if let Some(ann) = &self.annotation {
                    s.push_str(&format!(": {ann}"));
                }
                if let Some(value) = &self.value {
                    s.push_str(&format!(" = {value}"));
                }
                s
            }
        }
    }
}

fn render_param(p: &Param) -> String {
    let mut s = p.name.clone();
    if let Some(ann) = &p.annotation {
        s.push_str(&format!(": {ann}"));
    }
    if let Some(def) = &p.default {
        s.push_str(&format!(" = {def}"));
    }
    s
}

/// Extract all symbols from a parsed module, in source order.
pub fn extract(root: &Node, src: &[u8]) -> Vec<Symbol> {
    let mut out = Vec::new();
    walk_block(*root, src, None, &mut out);
    out
}

/// Walk the statements of a block. `scope` is the qualified name of the
/// enclosing class when this block is a class body.
fn walk_block(node: Node, src: &[u8], scope: Option<&str>, out: &mut Vec<Symbol>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" | "class_definition" => {
                handle_definition(&child, &child, Vec::new(), src, scope, out);
            }
            "decorated_definition" => {
                let decorators = decorator_names(&child, src);
                if let Some(inner) = decorated_inner(&child) {
                    handle_definition(&child, &inner, decorators, src, scope, out);
                }
            }
            "expression_statement" => {
                if let Some(sym) = binding_symbol(&child, src, scope) {
                    out.push(sym);
                }
            }
            "if_statement" | "for_statement" | "while_statement" | "try_statement"
            | "with_statement" | "match_statement" => {
                walk_nested_blocks(child, src, scope, out);
            }
            _ => {}
        }
    }
}

/// Descend through compound-statement clauses until blocks are found, then
/// resume the normal block walk. Handles elif/else/except/finally
/// transitively.
fn walk_nested_blocks(node: Node, src: &[u8], scope: Option<&str>, out: &mut Vec<Symbol>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "block" {
            walk_block(child, src, scope, out);
        } else {
            walk_nested_blocks(child, src, scope, out);
        }
    }
}

/// Emit a symbol for a `def` or `class`. `outer` differs from `inner` for
/// decorated definitions so that the span includes the decorator lines.
fn handle_definition(
    outer: &Node,
    inner: &Node,
    decorators: Vec<String>,
    src: &[u8],
    scope: Option<&str>,
    out: &mut Vec<Symbol>,
) {
    let name = match field_text(inner, "name", src) {
        Some(n) => n,
        None => return,
    };
    let qualified_name = match scope {
        Some(s) => format!("{s}.{name}"),
        None => name.clone(),
    };

    match inner.kind() {
        "class_definition" => {
            let bases = base_classes(inner, src);
            out.push(Symbol {
                name,
                qualified_name: qualified_name.clone(),
                kind: SymbolKind::Class,
                parent: scope.map(|s| s.to_string()),
                start_line: outer.start_position().row + 1,
                end_line: outer.end_position().row + 1,
                is_async: false,
                bases,
                decorators,
                params: Vec::new(),
                return_annotation: None,
                annotation: None,
                value: None,
                docstring: inner
                    .child_by_field_name("body")
                    .and_then(|b| docstring::from_body(&b, src)),
            });
            if let Some(body) = inner.child_by_field_name("body") {
                walk_block(body, src, Some(&qualified_name), out);
            }
        }
        "function_definition" => {
            let kind = if scope.is_none() {
                SymbolKind::Function
            } else if decorators.iter().any(|d| d == "property") {
                SymbolKind::Property
            } else {
                SymbolKind::Method
            };
            let is_async = has_child_token(inner, "async");
            out.push(Symbol {
                name,
                qualified_name,
                kind,
                parent: scope.map(|s| s.to_string()),
                start_line: outer.start_position().row + 1,
                end_line: outer.end_position().row + 1,
                is_async,
                bases: Vec::new(),
                decorators,
                params: inner
                    .child_by_field_name("parameters")
                    .map(|p| parse_parameters(&p, src))
                    .unwrap_or_default(),
                return_annotation: field_text(inner, "return_type", src),
                annotation: None,
                value: None,
                docstring: inner
                    .child_by_field_name("body")
                    .and_then(|b| docstring::from_body(&b, src)),
            });
        }
        _ => {}
    }
}

/// Names from the decorator lines of a `decorated_definition`, `@` stripped.
fn decorator_names(node: &Node, src: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .filter_map(|c| c.utf8_text(src).ok())
        .map(|t| t.trim_start_matches('@').trim().to_string())
        .collect()
}

/// The wrapped `def` or `class` of a `decorated_definition`.
fn decorated_inner<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    if let Some(def) = node.child_by_field_name("definition") {
        return Some(def);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(child.kind(), "function_definition" | "class_definition") {
            return Some(child);
        }
    }
    None
}

/// Whether `node` has a direct child token of the given kind.
fn has_child_token(node: &Node, token: &str) -> bool {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == token {
            return true;
        }
    }
    false
}

fn base_classes(node: &Node, src: &[u8]) -> Vec<String> {
    let Some(superclasses) = node.child_by_field_name("superclasses") else {
        return Vec::new();
    };
    let mut cursor = superclasses.walk();
    superclasses
        .named_children(&mut cursor)
        .filter_map(|c| c.utf8_text(src).ok())
        .map(|t| t.to_string())
        .collect()
}

fn field_text(node: &Node, field: &str, src: &[u8]) -> Option<String> {
    node.child_by_field_name(field)?
        .utf8_text(src)
        .ok()
        .map(|s| s.to_string())
}

fn parse_parameters(parameters: &Node, src: &[u8]) -> Vec<Param> {
    let mut cursor = parameters.walk();
    let mut params = Vec::new();

    for child in parameters.named_children(&mut cursor) {
        let param = match child.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                child.utf8_text(src).ok().map(|name| Param {
                    name: name.to_string(),
                    annotation: None,
                    default: None,
                })
            }
            // `x: int` - the identifier is a plain child, the type a field
            "typed_parameter" => {
                let mut inner = child.walk();
                let name = child
                    .named_children(&mut inner)
                    .find(|c| c.kind() != "type")
                    .and_then(|c| c.utf8_text(src).ok().map(|s| s.to_string()));
                name.map(|name| Param {
                    name,
                    annotation: field_text(&child, "type", src),
                    default: None,
                })
            }
            // `x = 1` and `x: int = 1`
            "default_parameter" | "typed_default_parameter" => {
                field_text(&child, "name", src).map(|name| Param {
                    name,
                    annotation: field_text(&child, "type", src),
                    default: field_text(&child, "value", src),
                })
            }
            _ => None,
        };
        if let Some(param) = param {
            params.push(param);
        }
    }

    params
}

fn is_upper_snake_case(name: &str) -> bool {
    !name.is_empty()
        && name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Module- or class-level binding from an `expression_statement`, if it
/// qualifies.
///
/// Kept: UPPER_SNAKE_CASE constants, annotated assignments (class fields /
/// module variables), lambda bindings, and comprehension results. Plain
/// lowercase assignments, tuple unpacking, attribute targets, and augmented
/// assignments are ignored.
fn binding_symbol(stmt: &Node, src: &[u8], scope: Option<&str>) -> Option<Symbol> {
    let mut cursor = stmt.walk();
    let assignment = stmt
        .named_children(&mut cursor)
        .find(|c| c.kind() == "assignment")?;

    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }

    let name = left.utf8_text(src).ok()?.to_string();
    let annotation = field_text(&assignment, "type", src);
    let right = assignment.child_by_field_name("right");
    let right_kind = right.map(|r| r.kind());

    let kind = if right_kind == Some("lambda") {
        SymbolKind::Lambda
    } else if is_upper_snake_case(&name) {
        SymbolKind::Constant
    } else if annotation.is_some() {
        if scope.is_some() {
            SymbolKind::Field
        } else {
            SymbolKind::Variable
        }
    } else if matches!(
        right_kind,
        Some(
            "list_comprehension"
                | "set_comprehension"
                | "dictionary_comprehension"
                | "generator_expression"
        )
    ) {
        SymbolKind::Variable
    } else {
        return None;
    };

    let qualified_name = match scope {
        Some(s) => format!("{s}.{name}"),
        None => name.clone(),
    };

    Some(Symbol {
        name,
        qualified_name,
        kind,
        parent: scope.map(|s| s.to_string()),
        start_line: stmt.start_position().row + 1,
        end_line: stmt.end_position().row + 1,
        is_async: false,
        bases: Vec::new(),
        decorators: Vec::new(),
        params: Vec::new(),
        return_annotation: None,
        annotation,
        value: right.and_then(|r| r.utf8_text(src).ok()).map(|s| s.to_string()),
        docstring: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::python::PythonAnalyzer;

    fn symbols_for(source: &str) -> Vec<Symbol> {
        let mut analyzer = PythonAnalyzer::new().unwrap();
        analyzer.analyze("test.py", source).unwrap().symbols
    }

    fn find<'a>(symbols: &'a [Symbol], qname: &str) -> &'a Symbol {
        symbols
            .iter()
            .find(|s| s.qualified_name == qname)
            .unwrap_or_else(|| panic!("symbol {qname} not found"))
    }

    #[test]
    fn inheritance_and_module_bindings() {
        let symbols = symbols_for(include_str!("../../test_cases/symbols_sample.py"));

        let dog = find(&symbols, "Dog");
        assert_eq!(dog.kind, SymbolKind::Class);
        assert_eq!(dog.bases, vec!["Animal".to_string()]);
        assert!(find(&symbols, "Animal").bases.is_empty());

        let square = find(&symbols, "square");
        assert_eq!(square.kind, SymbolKind::Lambda);
        assert!(square.parent.is_none());

        let numbers = find(&symbols, "numbers");
        assert_eq!(numbers.kind, SymbolKind::Variable);
        assert_eq!(numbers.value.as_deref(), Some("[i for i in range(10)]"));

        let version = find(&symbols, "API_VERSION");
        assert_eq!(version.kind, SymbolKind::Constant);
        assert_eq!(version.value.as_deref(), Some("'1.0.0'"));

        // Plain lowercase assignment is not a binding we keep
        assert!(!symbols.iter().any(|s| s.name == "global_counter"));
    }

    #[test]
    fn methods_scoped_under_their_class() {
        let symbols = symbols_for(include_str!("../../test_cases/symbols_sample.py"));

        let bark = find(&symbols, "Dog.make_sound");
        assert_eq!(bark.kind, SymbolKind::Method);
        assert_eq!(bark.parent.as_deref(), Some("Dog"));
        assert_eq!(bark.return_annotation.as_deref(), Some("str"));

        // Same method name exists on both classes, scoped apart
        assert!(symbols
            .iter()
            .any(|s| s.qualified_name == "Animal.make_sound"));
    }

    #[test]
    fn async_and_defaulted_parameters() {
        let symbols = symbols_for(include_str!("../../test_cases/symbols_sample.py"));

        let fetch = find(&symbols, "fetch_user");
        assert!(fetch.is_async);
        assert_eq!(fetch.kind, SymbolKind::Function);
        assert_eq!(fetch.return_annotation.as_deref(), Some("dict"));

        let greet = find(&symbols, "greet");
        assert!(!greet.is_async);
        assert_eq!(greet.params.len(), 2);
        assert_eq!(greet.params[0].name, "name");
        assert_eq!(greet.params[0].annotation.as_deref(), Some("str"));
        assert_eq!(greet.params[1].name, "greeting");
        assert_eq!(greet.params[1].default.as_deref(), Some("\"Hello\""));
        assert_eq!(greet.signature(), "def greet(name: str, greeting: str = \"Hello\") -> str");
    }

    #[test]
    fn every_utils_definition_enumerated_exactly_once() {
        let symbols = symbols_for(include_str!("../../test_cases/utils_sample.py"));

        let expected = [
            "reverse_string",
            "find_max",
            "StringProcessor",
            "StringProcessor.__init__",
            "StringProcessor.to_upper",
            "StringProcessor.to_lower",
            "StringProcessor.word_count",
        ];
        assert_eq!(symbols.len(), expected.len());
        for qname in expected {
            assert_eq!(
                symbols.iter().filter(|s| s.qualified_name == qname).count(),
                1,
                "{qname} should appear exactly once"
            );
        }

        let reverse = find(&symbols, "reverse_string");
        assert_eq!(reverse.params.len(), 1);
        assert_eq!(reverse.params[0].annotation.as_deref(), Some("str"));
        assert_eq!(reverse.return_annotation.as_deref(), Some("str"));
    }

    #[test]
    fn dataclass_fields_and_property() {
        let symbols = symbols_for(include_str!("../../test_cases/ast_sample.py"));

        let user = find(&symbols, "User");
        assert_eq!(user.kind, SymbolKind::Class);
        assert_eq!(user.decorators, vec!["dataclass".to_string()]);

        let id = find(&symbols, "User.id");
        assert_eq!(id.kind, SymbolKind::Field);
        assert_eq!(id.annotation.as_deref(), Some("int"));
        assert!(id.value.is_none());

        let email = find(&symbols, "User.email");
        assert_eq!(email.kind, SymbolKind::Field);
        assert_eq!(email.annotation.as_deref(), Some("Optional[str]"));
        assert_eq!(email.value.as_deref(), Some("None"));

        let count = find(&symbols, "UserManager.user_count");
        assert_eq!(count.kind, SymbolKind::Property);
        assert_eq!(count.decorators, vec!["property".to_string()]);

        let fetch = find(&symbols, "fetch_user_data");
        assert!(fetch.is_async);
        assert_eq!(fetch.signature(), "async def fetch_user_data(user_id: int) -> User");
    }

    #[test]
    fn async_decorated_method() {
        let source = "class S:\n    @staticmethod\n    async def go():\n        pass\n";
        let symbols = symbols_for(source);
        let go = find(&symbols, "S.go");
        assert!(go.is_async);
        assert_eq!(go.decorators, vec!["staticmethod".to_string()]);
        assert_eq!(go.start_line, 2);
    }

    #[test]
    fn decorated_span_includes_decorator_line() {
        let source = "@dataclass\nclass Point:\n    x: int\n";
        let symbols = symbols_for(source);
        let point = find(&symbols, "Point");
        assert_eq!(point.start_line, 1);
    }

    #[test]
    fn definitions_inside_compound_statements() {
        let source = "if True:\n    def hidden():\n        pass\n";
        let symbols = symbols_for(source);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].qualified_name, "hidden");
        assert_eq!(symbols[0].kind, SymbolKind::Function);
    }

    #[test]
    fn upper_snake_case_rules() {
        assert!(is_upper_snake_case("MAX_RETRIES"));
        assert!(is_upper_snake_case("API_VERSION"));
        assert!(!is_upper_snake_case("Max_Size"));
        assert!(!is_upper_snake_case("__"));
        assert!(!is_upper_snake_case(""));
    }
}
