use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::python::{self, Docstring, ModuleReport, PythonAnalyzer, Symbol, SymbolKind};
use crate::scanner;

/// Execute the `outline` command: print the Python structure of a file or
/// every Python file under a directory.
pub fn run(path: &Path, docs: bool) -> Result<()> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Invalid path: {}", path.display()))?;

    let mut analyzer = PythonAnalyzer::new().context("Failed to initialize Python analyzer")?;

    if root.is_file() {
        if !python::is_python_file(&root) {
            anyhow::bail!("{} is not a Python file", root.display());
        }
        let content = fs::read_to_string(&root)
            .with_context(|| format!("Failed to read {}", root.display()))?;
        let report = analyzer
            .analyze(&root.display().to_string(), &content)
            .with_context(|| format!("Failed to parse {}", root.display()))?;
        print_module(&root.display().to_string(), &report, docs);
        return Ok(());
    }

    let result = scanner::scan(&root, &mut analyzer);
    let mut printed = 0;
    for file in &result.reports {
        if file.symbols.is_empty() {
            continue;
        }
        // Re-read for the module docstring; the scanner keeps only symbols
        // and markers per file.
        let content = match fs::read_to_string(root.join(&file.file_path)) {
            Ok(c) => c,
            Err(_) => continue,
        };
        let label = file.file_path.display().to_string();
        if let Ok(report) = analyzer.analyze(&label, &content) {
            if printed > 0 {
                println!();
            }
            print_module(&label, &report, docs);
            printed += 1;
        }
    }

    if printed == 0 {
        println!("{}", "No Python symbols found.".yellow());
    }

    Ok(())
}

fn print_module(label: &str, report: &ModuleReport, docs: bool) {
    println!("{}", label.bold().underline());

    if let Some(doc) = &report.docstring {
        println!("  {}", doc.summary.italic().dimmed());
    }

    for symbol in &report.symbols {
        print_symbol(symbol, docs);
    }

    if !report.markers.is_empty() {
        println!("  {}", format!("{} marker(s):", report.markers.len()).dimmed());
        for owned in &report.markers {
            let owner = owned
                .owner
                .as_deref()
                .map(|o| format!(" [{}]", o))
                .unwrap_or_default();
            println!(
                "    {} {} {}{}",
                format!("L{}", owned.marker.line_number).bold(),
                owned.marker.kind.to_string().yellow(),
                owned.marker.description,
                owner.dimmed()
            );
        }
    }
}

fn print_symbol(symbol: &Symbol, docs: bool) {
    let indent = if symbol.parent.is_some() { "    " } else { "  " };

    let rendered = match symbol.kind {
        SymbolKind::Class => symbol.signature().blue().bold().to_string(),
        SymbolKind::Function | SymbolKind::Method => symbol.signature().green().to_string(),
        SymbolKind::Property => format!("{} {}", "@property".magenta(), symbol.signature().green()),
        SymbolKind::Field => symbol.signature().cyan().to_string(),
        SymbolKind::Constant | SymbolKind::Variable | SymbolKind::Lambda => {
            format!(
                "{} {}",
                symbol.kind.as_str().dimmed(),
                symbol.signature().cyan()
            )
        }
    };

    println!(
        "{}{} {}",
        indent,
        rendered,
        format!("L{}-{}", symbol.start_line, symbol.end_line).dimmed()
    );

    if let Some(doc) = &symbol.docstring {
        if docs {
            print_docstring(doc, indent);
        } else if !doc.summary.is_empty() {
            println!("{}  {}", indent, doc.summary.dimmed());
        }
    }
}

fn print_docstring(doc: &Docstring, indent: &str) {
    // No structured sections: show the whole cleaned text
    if doc.args.is_empty() && doc.returns.is_none() && doc.raises.is_empty() {
        for line in doc.text.lines() {
            println!("{}  {}", indent, line.dimmed());
        }
        return;
    }
    if !doc.summary.is_empty() {
        println!("{}  {}", indent, doc.summary.dimmed());
    }
    if !doc.args.is_empty() {
        println!("{}  {}", indent, "Args:".dimmed());
        for entry in &doc.args {
            println!("{}    {}: {}", indent, entry.name.dimmed(), entry.description.dimmed());
        }
    }
    if let Some(returns) = &doc.returns {
        println!("{}  {} {}", indent, "Returns:".dimmed(), returns.dimmed());
    }
    if !doc.raises.is_empty() {
        println!("{}  {}", indent, "Raises:".dimmed());
        for entry in &doc.raises {
            println!("{}    {}: {}", indent, entry.name.dimmed(), entry.description.dimmed());
        }
    }
}
