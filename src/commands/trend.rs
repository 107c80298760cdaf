use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::error::CodeScoutError;
use crate::storage;

/// Execute the `trend` command: show historical snapshots with % change.
pub fn run() -> Result<()> {
    // Look for the DB in the current directory
    let root = Path::new(".")
        .canonicalize()
        .context("Failed to resolve current directory")?;

    let conn = storage::open_db(&root).context("Failed to open database")?;
    let snapshots = storage::get_snapshots(&conn)?;

    if snapshots.is_empty() {
        return Err(CodeScoutError::NoSnapshots.into());
    }

    println!(
        "  {:<6} {:<22} {:<9} {:<9} {}",
        "#".bold(),
        "Timestamp".bold(),
        "Markers".bold(),
        "Symbols".bold(),
        "Change".bold()
    );
    println!("  {}", "-".repeat(64));

    let mut prev_count: Option<i64> = None;

    for snap in &snapshots {
        let change_str = match prev_count {
            None => "  --".dimmed().to_string(),
            Some(prev) => {
                if prev == 0 {
                    if snap.marker_count > 0 {
                        format!("  {} +{}", "\u{2191}", snap.marker_count)
                            .red()
                            .to_string()
                    } else {
                        "  --".dimmed().to_string()
                    }
                } else {
                    let diff = snap.marker_count - prev;
                    let pct = ((diff as f64) / (prev as f64) * 100.0).round() as i64;
                    if diff > 0 {
                        format!("  \u{2191} +{} ({:+}%)", diff, pct).red().to_string()
                    } else if diff < 0 {
                        format!("  \u{2193} {} ({}%)", diff, pct).green().to_string()
                    } else {
                        "  = (0%)".dimmed().to_string()
                    }
                }
            }
        };

        let count_colored = if snap.marker_count == 0 {
            format!("{:<9}", snap.marker_count).green()
        } else if snap.marker_count <= 10 {
            format!("{:<9}", snap.marker_count).yellow()
        } else {
            format!("{:<9}", snap.marker_count).red()
        };

        println!(
            "  {:<6} {:<22} {} {:<9} {}",
            snap.id, snap.timestamp, count_colored, snap.symbol_count, change_str
        );

        prev_count = Some(snap.marker_count);
    }

    println!();
    println!("  {} snapshots total", snapshots.len().to_string().bold());

    Ok(())
}
