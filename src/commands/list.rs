use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::error::CodeScoutError;
use crate::git;
use crate::storage::{self, StoredMarker};

/// Execute the `list` command: list markers (or symbols) from the latest
/// snapshot.
pub fn run(path: &Path, oldest: Option<usize>, blame: bool, symbols: bool) -> Result<()> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Invalid path: {}", path.display()))?;

    let conn = storage::open_db(&root).context("Failed to open database")?;

    let snapshot = storage::get_latest_snapshot(&conn)?.ok_or(CodeScoutError::NoSnapshots)?;

    println!(
        "{}",
        format!(
            "Snapshot #{} ({}) - {} markers, {} symbols",
            snapshot.id, snapshot.timestamp, snapshot.marker_count, snapshot.symbol_count
        )
        .dimmed()
    );
    println!();

    if symbols {
        return list_symbols(&conn, snapshot.id);
    }

    let mut items = storage::get_markers_for_snapshot(&conn, snapshot.id)?;

    // If --blame is passed, blame each file once for all its marker lines
    if blame && git::is_git_repo(&root) {
        println!("{}", "Running git blame (this may take a moment)...".dimmed());
        apply_blame(&conn, &root, &mut items);
        println!();
    }

    // If --oldest N is specified, sort by git_date ascending and take N
    if let Some(n) = oldest {
        if !blame {
            eprintln!(
                "{}",
                "Warning: --oldest works best with --blame to get git dates.".yellow()
            );
            eprintln!("{}", "Showing markers without date sorting.\n".yellow());
        } else {
            items.sort_by(|a, b| {
                let date_a = a.git_date.as_deref().unwrap_or("9999-99-99");
                let date_b = b.git_date.as_deref().unwrap_or("9999-99-99");
                date_a.cmp(date_b)
            });
        }
        items.truncate(n);
    }

    for item in &items {
        print_marker(item);
    }

    if items.is_empty() {
        println!("{}", "No markers found.".green());
    }

    Ok(())
}

fn list_symbols(conn: &rusqlite::Connection, snapshot_id: i64) -> Result<()> {
    let rows = storage::get_symbols_for_snapshot(conn, snapshot_id)?;

    let mut current_file = String::new();
    for row in &rows {
        if row.file_path != current_file {
            println!("{}", row.file_path.bold().underline());
            current_file = row.file_path.clone();
        }
        let indent = if row.parent.is_some() { "    " } else { "  " };
        println!(
            "{}{} {} {}",
            indent,
            row.kind.dimmed(),
            row.signature,
            format!("L{}-{}", row.start_line, row.end_line).dimmed()
        );
    }

    if rows.is_empty() {
        println!("{}", "No symbols stored in this snapshot.".yellow());
    }

    Ok(())
}

/// Group markers by file, blame each file once, update rows in memory and
/// in the database. Blame failures for individual files are skipped.
fn apply_blame(conn: &rusqlite::Connection, root: &Path, items: &mut [StoredMarker]) {
    let mut by_file: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, item) in items.iter().enumerate() {
        by_file.entry(item.file_path.clone()).or_default().push(idx);
    }

    for (file_path, indices) in by_file {
        let lines: Vec<usize> = indices
            .iter()
            .map(|&i| items[i].line_number as usize)
            .collect();

        let blames = match git::blame_lines(root, &file_path, &lines) {
            Ok(b) => b,
            Err(_) => continue,
        };

        for &idx in &indices {
            let line = items[idx].line_number as usize;
            if let Some(info) = blames.get(&line) {
                items[idx].git_author = Some(info.author.clone());
                items[idx].git_date = Some(info.date.clone());
                let _ = storage::update_git_blame(conn, items[idx].id, &info.author, &info.date);
            }
        }
    }
}

fn print_marker(item: &StoredMarker) {
    let location = format!("{}:{}", item.file_path, item.line_number).bold();

    let kind = match item.kind.as_str() {
        "TODO" => item.kind.yellow(),
        "FIXME" => item.kind.red(),
        "NOTE" => item.kind.cyan(),
        "HACK" => item.kind.magenta(),
        "XXX" | "BUG" => item.kind.red().bold(),
        _ => item.kind.normal(),
    };

    let mut parts = vec![format!("  {} {} {}", location, kind, item.description)];

    if let Some(ref owner) = item.owner {
        parts.push(format!(" [{}]", owner).dimmed().to_string());
    }
    if let Some(ref author) = item.author {
        parts.push(format!(" ({})", author).dimmed().to_string());
    }
    if let Some(ref issue) = item.issue_ref {
        parts.push(format!(" {}", issue).cyan().to_string());
    }

    print!("{}", parts.join(""));

    if item.git_author.is_some() || item.git_date.is_some() {
        let blame_author = item.git_author.as_deref().unwrap_or("?");
        let blame_date = item.git_date.as_deref().unwrap_or("?");
        print!(" {}", format!("[{} on {}]", blame_author, blame_date).dimmed());
    }

    println!();
}
