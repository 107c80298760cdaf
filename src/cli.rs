use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "code-scout")]
#[command(about = "Extract marker comments, docstrings, and symbols from source trees")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan files for markers and Python symbols, store a snapshot
    Scan {
        /// Path to scan (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Print the Python symbol outline of a file or directory
    Outline {
        /// File or directory to analyze
        path: PathBuf,

        /// Show full docstring sections instead of summaries
        #[arg(long, default_value_t = false)]
        docs: bool,
    },

    /// List markers from the most recent snapshot
    List {
        /// Path of the scanned project (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Show only the N oldest markers by git blame date
        #[arg(long)]
        oldest: Option<usize>,

        /// Run git blame to show authorship info
        #[arg(long, default_value_t = false)]
        blame: bool,

        /// List stored symbols instead of markers
        #[arg(long, default_value_t = false)]
        symbols: bool,
    },

    /// Show historical trend of marker counts
    Trend,

    /// CI check: exit 1 if marker count exceeds max
    Check {
        /// Maximum allowed marker count
        #[arg(long)]
        max: usize,
    },
}
