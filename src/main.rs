mod cli;
mod commands;
mod error;
mod git;
mod markers;
mod python;
mod scanner;
mod storage;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan { path } => {
            commands::scan::run(&path)?;
        }
        Command::Outline { path, docs } => {
            commands::outline::run(&path, docs)?;
        }
        Command::List {
            path,
            oldest,
            blame,
            symbols,
        } => {
            commands::list::run(&path, oldest, blame, symbols)?;
        }
        Command::Trend => {
            commands::trend::run()?;
        }
        Command::Check { max } => {
            commands::check::run(max)?;
        }
    }

    Ok(())
}
