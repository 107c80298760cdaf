use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// The recognized marker tokens, in conventional severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Todo,
    Fixme,
    Note,
    Hack,
    Xxx,
    Bug,
}

impl MarkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerKind::Todo => "TODO",
            MarkerKind::Fixme => "FIXME",
            MarkerKind::Note => "NOTE",
            MarkerKind::Hack => "HACK",
            MarkerKind::Xxx => "XXX",
            MarkerKind::Bug => "BUG",
        }
    }
}

impl FromStr for MarkerKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TODO" => Ok(MarkerKind::Todo),
            "FIXME" => Ok(MarkerKind::Fixme),
            "NOTE" => Ok(MarkerKind::Note),
            "HACK" => Ok(MarkerKind::Hack),
            "XXX" => Ok(MarkerKind::Xxx),
            "BUG" => Ok(MarkerKind::Bug),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A marker comment extracted from a single line of source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// The line number (1-indexed) in the file
    pub line_number: usize,
    /// Which marker token was matched
    pub kind: MarkerKind,
    /// Optional author extracted from e.g. TODO(alice):
    pub author: Option<String>,
    /// Optional issue reference extracted from #123-style patterns
    pub issue_ref: Option<String>,
    /// The text after the marker token
    pub description: String,
}

// Tokens that indicate a line contains a comment
const COMMENT_INTRODUCERS: &[&str] = &["//", "#", "/*", "<!--", "*", "--"];

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(TODO|FIXME|NOTE|HACK|XXX|BUG)\b(?:\(([^)]+)\))?:?\s*(.*)")
        .expect("MARKER_RE pattern must be valid")
});

static ISSUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").expect("ISSUE_RE pattern must be valid"));

fn line_has_comment_introducer(line: &str) -> bool {
    let trimmed = line.trim();
    COMMENT_INTRODUCERS.iter().any(|tok| trimmed.contains(tok))
}

/// Classify marker text that is already known to be a comment (used by the
/// tree-sitter path, where the comment node tells us the line is a comment).
pub fn classify_comment(text: &str, line_number: usize) -> Option<Marker> {
    let caps = MARKER_RE.captures(text)?;

    let kind = MarkerKind::from_str(caps.get(1)?.as_str()).ok()?;
    let author = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|a| !a.is_empty());
    let description = caps.get(3).map_or("", |m| m.as_str()).trim().to_string();

    let issue_ref = ISSUE_RE
        .captures(&description)
        .map(|c| format!("#{}", &c[1]));

    Some(Marker {
        line_number,
        kind,
        author,
        issue_ref,
        description,
    })
}

/// Parse a single line of text and return a Marker if it looks like a marker
/// comment. Pure function, no IO.
pub fn parse_line(line: &str, line_number: usize) -> Option<Marker> {
    if !line_has_comment_introducer(line) {
        return None;
    }
    classify_comment(line, line_number)
}

/// Parse all lines in a string and return every marker found. Pure function,
/// no IO.
pub fn parse_content(content: &str) -> Vec<Marker> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| parse_line(line, idx + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_todo() {
        let item = parse_line("// TODO: fix this later", 1).unwrap();
        assert_eq!(item.kind, MarkerKind::Todo);
        assert_eq!(item.description, "fix this later");
        assert!(item.author.is_none());
        assert!(item.issue_ref.is_none());
    }

    #[test]
    fn todo_with_author() {
        let item = parse_line("// TODO(alice): refactor this", 5).unwrap();
        assert_eq!(item.kind, MarkerKind::Todo);
        assert_eq!(item.author.as_deref(), Some("alice"));
        assert_eq!(item.description, "refactor this");
    }

    #[test]
    fn fixme_with_issue() {
        let item = parse_line("# FIXME: broken sorting see #42", 10).unwrap();
        assert_eq!(item.kind, MarkerKind::Fixme);
        assert_eq!(item.issue_ref.as_deref(), Some("#42"));
    }

    #[test]
    fn note_and_bug_kinds() {
        assert_eq!(
            parse_line("# NOTE: should be optimized", 1).unwrap().kind,
            MarkerKind::Note
        );
        assert_eq!(
            parse_line("# BUG: known issue", 2).unwrap().kind,
            MarkerKind::Bug
        );
    }

    #[test]
    fn hack_in_block_comment() {
        let item = parse_line("/* HACK: temporary workaround */", 3).unwrap();
        assert_eq!(item.kind, MarkerKind::Hack);
    }

    #[test]
    fn xxx_comment() {
        let item = parse_line("// XXX: needs review", 1).unwrap();
        assert_eq!(item.kind, MarkerKind::Xxx);
    }

    #[test]
    fn case_insensitive() {
        let item = parse_line("# todo: lowercase works", 1).unwrap();
        assert_eq!(item.kind, MarkerKind::Todo);
    }

    #[test]
    fn no_comment_introducer() {
        assert!(parse_line("let x = TODO something", 1).is_none());
    }

    #[test]
    fn no_false_positive_substring() {
        // "NoteStruct" must not match: "Note" is a substring, not the word NOTE
        assert!(classify_comment("# A NoteStruct holds notes.", 1).is_none());
    }

    #[test]
    fn empty_author_dropped() {
        let item = parse_line("// TODO(): empty author", 1).unwrap();
        assert!(item.author.is_none());
    }

    #[test]
    fn marker_without_description() {
        let item = parse_line("// TODO:", 1).unwrap();
        assert_eq!(item.kind, MarkerKind::Todo);
        assert_eq!(item.description, "");
    }

    #[test]
    fn parse_content_line_numbers() {
        let content = "fn main() {\n    // TODO: first\n    let x = 1;\n    // BUG: second\n}\n";
        let items = parse_content(content);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].line_number, 2);
        assert_eq!(items[1].line_number, 4);
        assert_eq!(items[1].kind, MarkerKind::Bug);
    }

    #[test]
    fn edge_case_fixture_counts() {
        let content = include_str!("../test_cases/marker_edges.txt");
        let items = parse_content(content);
        // Every kind shows up somewhere in the fixture
        for kind in [
            MarkerKind::Todo,
            MarkerKind::Fixme,
            MarkerKind::Note,
            MarkerKind::Hack,
            MarkerKind::Xxx,
            MarkerKind::Bug,
        ] {
            assert!(
                items.iter().any(|m| m.kind == kind),
                "missing kind {kind} in fixture"
            );
        }
        // Identifier-only lines did not produce markers from their names
        assert!(!items
            .iter()
            .any(|m| m.description.contains("Not a marker")));
    }
}
