use anyhow::Result;
use clap::Args;
use colored::Colorize;
use treekit_engine::{Category, OPERATIONS};

#[derive(Debug, Args)]
pub struct OpsArgs {
    /// Print the registry as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn ops(args: OpsArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(OPERATIONS)?);
        return Ok(());
    }

    for info in OPERATIONS {
        let category = match info.category {
            Category::Filter => "filter".cyan(),
            Category::Structure => "structure".magenta(),
            Category::Combinator => "combinator".yellow(),
        };
        let alias = info
            .alias_of
            .map(|target| format!(" (alias of {})", target))
            .unwrap_or_default();

        println!(
            "{:<10} {:<11} {}{}",
            info.name.bold(),
            category,
            info.description,
            alias.dimmed()
        );

        for param in info.parameters {
            let required = if param.required { "required" } else { "optional" };
            println!(
                "{:<22} {} - {} ({})",
                "",
                param.name.bright_white(),
                param.description,
                required.dimmed()
            );
        }
        for example in info.examples {
            println!("{:<22} {}", "", example.green());
        }
    }

    Ok(())
}
