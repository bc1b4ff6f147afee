use super::{read_source, report_dsl_errors};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use treekit_dsl::{parse_with_errors, DslError};

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Script to parse
    pub script: PathBuf,

    /// Print the statements back as script text instead of JSON
    #[arg(long)]
    pub source: bool,
}

pub fn parse(args: ParseArgs, cwd: &str) -> Result<()> {
    let source = read_source(&args.script, cwd)?;

    let (statements, errors) = match parse_with_errors(&source) {
        Ok(parsed) => parsed,
        Err(err) => {
            report_dsl_errors(&source, &args.script, vec![err.clone().into()]);
            return Err(anyhow!(err));
        }
    };

    if args.source {
        for statement in &statements {
            println!("{}", statement);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&statements)?);
    }

    if !errors.is_empty() {
        let count = errors.len();
        report_dsl_errors(
            &source,
            &args.script,
            errors.into_iter().map(DslError::from).collect(),
        );
        eprintln!(
            "{} {} malformed statement(s) skipped",
            "⚠️".yellow(),
            count
        );
    }

    Ok(())
}
