use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::markers::MarkerKind;
use crate::python::PythonAnalyzer;
use crate::scanner;
use crate::storage;

/// Execute the `scan` command: extract markers and symbols, print the
/// marker report, store a snapshot.
pub fn run(path: &Path) -> Result<()> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Invalid scan path: {}", path.display()))?;

    println!("{}", format!("Scanning {}...", root.display()).dimmed());

    let mut analyzer = PythonAnalyzer::new().context("Failed to initialize Python analyzer")?;
    let result = scanner::scan(&root, &mut analyzer);
    let marker_count = result.marker_count();
    let symbol_count = result.symbol_count();

    // Count unique files with markers
    let files_with_markers: HashSet<_> = result
        .reports
        .iter()
        .filter(|r| !r.markers.is_empty())
        .map(|r| r.file_path.clone())
        .collect();

    for report in &result.reports {
        for owned in &report.markers {
            let location = format!(
                "{}:{}",
                report.file_path.display(),
                owned.marker.line_number
            )
            .bold();

            let kind = colorize_kind(owned.marker.kind);

            let mut extras = Vec::new();
            if let Some(ref owner) = owned.owner {
                extras.push(format!("[{}]", owner));
            }
            if let Some(ref author) = owned.marker.author {
                extras.push(format!("({})", author));
            }
            if let Some(ref issue) = owned.marker.issue_ref {
                extras.push(issue.clone());
            }

            let extras_str = if extras.is_empty() {
                String::new()
            } else {
                format!(" {}", extras.join(" ").dimmed())
            };

            println!(
                "  {} {} {}{}",
                location, kind, owned.marker.description, extras_str
            );
        }
    }

    let summary = format!(
        "Found {} markers across {} files, {} symbols",
        marker_count,
        files_with_markers.len(),
        symbol_count
    );
    let colored_summary = if marker_count == 0 {
        summary.green()
    } else if marker_count <= 10 {
        summary.yellow()
    } else {
        summary.red()
    };
    println!("\n{}", colored_summary);
    println!(
        "{}",
        format!(
            "({} files scanned, {} skipped)",
            result.files_scanned, result.files_skipped
        )
        .dimmed()
    );

    let conn = storage::open_db(&root).context("Failed to open database")?;
    let snapshot_id =
        storage::save_snapshot(&conn, &result.reports).context("Failed to save snapshot")?;

    println!("{}", format!("Snapshot #{} saved.", snapshot_id).green());

    Ok(())
}

fn colorize_kind(kind: MarkerKind) -> colored::ColoredString {
    match kind {
        MarkerKind::Todo => kind.as_str().yellow(),
        MarkerKind::Fixme => kind.as_str().red(),
        MarkerKind::Note => kind.as_str().cyan(),
        MarkerKind::Hack => kind.as_str().magenta(),
        MarkerKind::Xxx => kind.as_str().red().bold(),
        MarkerKind::Bug => kind.as_str().red().bold(),
    }
}
