use super::load_document;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct IdsArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// Show the heading outline instead of every id
    #[arg(long)]
    pub outline: bool,
}

pub fn ids(args: IdsArgs, cwd: &str) -> Result<()> {
    let document = load_document(&args.input, cwd)?;

    if args.outline {
        for entry in document.outline() {
            let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
            let id = entry
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{}{} {}", indent, entry.text.bold(), id.dimmed());
        }
        return Ok(());
    }

    for id in document.all_ids() {
        println!("{}", id);
    }

    Ok(())
}
