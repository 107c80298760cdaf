use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::markers::{self, Marker};
use crate::python::{self, OwnedMarker, PythonAnalyzer, Symbol};

/// Maximum file size to scan (1 MB). Files larger than this are skipped.
const MAX_FILE_SIZE: u64 = 1_048_576;

/// Directories to always skip during scanning.
const SKIP_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "vendor",
    ".code-scout",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    "build",
];

/// What was extracted from one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Path relative to the scan root
    pub file_path: PathBuf,
    pub markers: Vec<OwnedMarker>,
    pub symbols: Vec<Symbol>,
}

/// Result of scanning a directory tree.
#[derive(Debug)]
pub struct ScanResult {
    pub reports: Vec<FileReport>,
    pub files_scanned: usize,
    pub files_skipped: usize,
}

impl ScanResult {
    pub fn marker_count(&self) -> usize {
        self.reports.iter().map(|r| r.markers.len()).sum()
    }

    pub fn symbol_count(&self) -> usize {
        self.reports.iter().map(|r| r.symbols.len()).sum()
    }
}

fn should_skip_dir(dir_name: &str) -> bool {
    SKIP_DIRS.contains(&dir_name)
}

/// Markers without ownership, for non-Python files and Python files the
/// parser rejects.
fn line_based_markers(content: &str) -> Vec<OwnedMarker> {
    markers::parse_content(content)
        .into_iter()
        .map(|marker: Marker| OwnedMarker {
            marker,
            owner: None,
        })
        .collect()
}

/// Analyze a single file's content. Python files get the full tree-sitter
/// treatment; everything else (and unparseable Python) gets line-based
/// marker extraction only.
pub fn analyze_file(
    analyzer: &mut PythonAnalyzer,
    path: &Path,
    content: &str,
) -> (Vec<OwnedMarker>, Vec<Symbol>) {
    if python::is_python_file(path) {
        match analyzer.analyze(&path.display().to_string(), content) {
            Ok(report) => return (report.markers, report.symbols),
            Err(_) => return (line_based_markers(content), Vec::new()),
        }
    }
    (line_based_markers(content), Vec::new())
}

/// Scan a directory tree for markers and Python symbols.
/// Skips files > MAX_FILE_SIZE, non-UTF-8 files, and known non-source
/// directories. A single-file root is scanned as well.
pub fn scan(root: &Path, analyzer: &mut PythonAnalyzer) -> ScanResult {
    let mut reports = Vec::new();
    let mut files_scanned: usize = 0;
    let mut files_skipped: usize = 0;

    let walker = WalkDir::new(root).follow_links(false).into_iter();

    for entry in walker.filter_entry(|e| {
        if e.file_type().is_dir() {
            if let Some(name) = e.file_name().to_str() {
                return !should_skip_dir(name);
            }
        }
        true
    }) {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => {
                files_skipped += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();

        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(_) => {
                files_skipped += 1;
                continue;
            }
        };

        if metadata.len() > MAX_FILE_SIZE {
            files_skipped += 1;
            continue;
        }

        // Read the file, skipping non-UTF-8 files gracefully
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => {
                files_skipped += 1;
                continue;
            }
        };

        files_scanned += 1;

        let (file_markers, file_symbols) = analyze_file(analyzer, path, &content);
        if file_markers.is_empty() && file_symbols.is_empty() {
            continue;
        }

        // A single-file root strips to an empty path; keep the file name
        let relative = path
            .strip_prefix(root)
            .ok()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| match path.file_name() {
                Some(name) => PathBuf::from(name),
                None => path.to_path_buf(),
            });
        reports.push(FileReport {
            file_path: relative,
            markers: file_markers,
            symbols: file_symbols,
        });
    }

    ScanResult {
        reports,
        files_scanned,
        files_skipped,
    }
}
