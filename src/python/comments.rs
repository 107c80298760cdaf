//! Marker-comment collection with ownership attribution.
//!
//! Comment nodes come from the CST, so every comment is considered without
//! any comment-introducer heuristics. Ownership precedence: the definition
//! the comment immediately precedes (only blank or comment lines between),
//! else the innermost enclosing definition, else module level.

use tree_sitter::Node;

use crate::markers::{self, Marker};
use crate::python::symbols::Symbol;

/// A marker comment plus the qualified name of the definition it belongs to.
/// `owner` is `None` for module-level markers.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedMarker {
    pub marker: Marker,
    pub owner: Option<String>,
}

/// Collect every marker comment in the module, attributed to its owner.
pub fn collect(root: &Node, source: &str, symbols: &[Symbol]) -> Vec<OwnedMarker> {
    let lines: Vec<&str> = source.lines().collect();
    let mut out = Vec::new();
    walk_comments(*root, source.as_bytes(), &lines, symbols, &mut out);
    out
}

fn walk_comments(
    node: Node,
    src: &[u8],
    lines: &[&str],
    symbols: &[Symbol],
    out: &mut Vec<OwnedMarker>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "comment" {
            let line_number = child.start_position().row + 1;
            if let Ok(text) = child.utf8_text(src) {
                if let Some(marker) = markers::classify_comment(text, line_number) {
                    let owner = owner_of(line_number, lines, symbols);
                    out.push(OwnedMarker { marker, owner });
                }
            }
        } else {
            walk_comments(child, src, lines, symbols, out);
        }
    }
}

/// Attribute a comment line to a definition.
fn owner_of(comment_line: usize, lines: &[&str], symbols: &[Symbol]) -> Option<String> {
    if let Some(next) = following_definition(comment_line, lines, symbols) {
        return Some(next);
    }
    enclosing_definition(comment_line, symbols)
}

/// The definition starting on the first non-blank, non-comment line after
/// the comment, if any.
fn following_definition(
    comment_line: usize,
    lines: &[&str],
    symbols: &[Symbol],
) -> Option<String> {
    let mut line = comment_line + 1;
    while let Some(text) = lines.get(line - 1) {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            line += 1;
            continue;
        }
        return symbols
            .iter()
            .find(|s| s.is_definition() && s.start_line == line)
            .map(|s| s.qualified_name.clone());
    }
    None
}

/// The innermost definition whose span contains the comment line.
fn enclosing_definition(comment_line: usize, symbols: &[Symbol]) -> Option<String> {
    symbols
        .iter()
        .filter(|s| {
            s.is_definition() && s.start_line <= comment_line && comment_line <= s.end_line
        })
        .max_by_key(|s| s.start_line)
        .map(|s| s.qualified_name.clone())
}
