//! Docstring harvesting and structured-section parsing.
//!
//! A docstring is the string expression appearing as the first statement of
//! a module, class, or function body. Google-style `Args:` / `Returns:` /
//! `Raises:` sections are parsed into named entries.

use tree_sitter::Node;

/// A `name: description` entry under an Args or Raises section.
#[derive(Debug, Clone, PartialEq)]
pub struct DocEntry {
    pub name: String,
    pub description: String,
}

/// A parsed docstring.
#[derive(Debug, Clone, PartialEq)]
pub struct Docstring {
    /// First paragraph, joined to a single line
    pub summary: String,
    /// Full cleaned text (quotes stripped, dedented)
    pub text: String,
    pub args: Vec<DocEntry>,
    pub returns: Option<String>,
    pub raises: Vec<DocEntry>,
}

/// Docstring of a `block` node (function or class body), if present.
pub fn from_body(body: &Node, src: &[u8]) -> Option<Docstring> {
    first_string_expression(body, src).map(parse)
}

/// Module docstring: the first statement of the source file.
pub fn module_docstring(root: &Node, src: &[u8]) -> Option<Docstring> {
    first_string_expression(root, src).map(parse)
}

fn first_string_expression(node: &Node, src: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    let first = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let mut inner = first.walk();
    let string = first
        .named_children(&mut inner)
        .find(|c| c.kind() == "string")?;
    string.utf8_text(src).ok().map(|s| s.to_string())
}

/// Parse a raw string literal (quotes included) into a Docstring.
pub fn parse(raw: String) -> Docstring {
    let text = clean(&raw);

    let mut summary_lines: Vec<&str> = Vec::new();
    let mut args = Vec::new();
    let mut returns_lines: Vec<String> = Vec::new();
    let mut raises = Vec::new();

    #[derive(PartialEq)]
    enum Section {
        Summary,
        Args,
        Returns,
        Raises,
        Other,
    }
    let mut section = Section::Summary;

    for line in text.lines() {
        let trimmed = line.trim();
        match trimmed {
            "Args:" | "Arguments:" | "Parameters:" => {
                section = Section::Args;
                continue;
            }
            "Returns:" => {
                section = Section::Returns;
                continue;
            }
            "Raises:" => {
                section = Section::Raises;
                continue;
            }
            _ => {}
        }

        match section {
            Section::Summary => {
                if trimmed.is_empty() {
                    if !summary_lines.is_empty() {
                        section = Section::Other;
                    }
                } else {
                    summary_lines.push(trimmed);
                }
            }
            Section::Args => push_entry(&mut args, trimmed),
            Section::Raises => push_entry(&mut raises, trimmed),
            Section::Returns => {
                if !trimmed.is_empty() {
                    returns_lines.push(trimmed.to_string());
                }
            }
            Section::Other => {}
        }
    }

    Docstring {
        summary: summary_lines.join(" "),
        text,
        args,
        returns: if returns_lines.is_empty() {
            None
        } else {
            Some(returns_lines.join(" "))
        },
        raises,
    }
}

/// Add an entry line to a section. `name: description` starts a new entry;
/// anything else continues the previous one.
fn push_entry(entries: &mut Vec<DocEntry>, line: &str) {
    if line.is_empty() {
        return;
    }
    if let Some((name, description)) = line.split_once(':') {
        let name = name.trim();
        // Entry names are identifiers; a colon inside prose is not an entry
        if !name.is_empty() && !name.contains(' ') {
            entries.push(DocEntry {
                name: name.to_string(),
                description: description.trim().to_string(),
            });
            return;
        }
    }
    if let Some(last) = entries.last_mut() {
        if !last.description.is_empty() {
            last.description.push(' ');
        }
        last.description.push_str(line);
    }
}

/// Strip string-prefix characters and quotes, then dedent and trim.
fn clean(raw: &str) -> String {
    let stripped = raw.trim_start_matches(|c: char| "rRbBuUfF".contains(c));

    let body = [r#"""""#, "'''", "\"", "'"]
        .iter()
        .find_map(|q| {
            stripped
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
        })
        .unwrap_or(stripped);

    dedent(body).trim().to_string()
}

fn dedent(text: &str) -> String {
    let min_indent = text
        .lines()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 || l.len() < min_indent {
                l.trim_end()
            } else {
                l[min_indent..].trim_end()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
