use super::{load_document, read_source, report_dsl_errors, resolve};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use treekit_core::{Document, Node, ProvenanceContext};
use treekit_dsl::DslError;
use treekit_engine::{ExecError, Executor};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Pipeline script to execute
    pub script: PathBuf,

    /// Input document JSON (defaults to an empty document)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Record provenance on the result nodes
    #[arg(long)]
    pub stamp: bool,

    /// Author for stamped provenance (overrides config and git)
    #[arg(long)]
    pub author: Option<String>,

    /// Emit compact JSON even if the config asks for pretty output
    #[arg(long)]
    pub compact: bool,

    /// Abort on the first malformed statement instead of skipping it
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: RunArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let source = read_source(&args.script, cwd)?;

    let document = match &args.input {
        Some(path) => load_document(path, cwd)?,
        None => Document::empty(),
    };

    let mut executor = Executor::new(document);
    let (value, parse_errors) = if args.strict {
        let value = executor
            .execute_strict(&source)
            .map_err(|err| script_failure(&source, &args.script, err))?;
        (value, Vec::new())
    } else {
        let output = executor
            .execute_source(&source)
            .map_err(|err| script_failure(&source, &args.script, err))?;
        (output.value, output.parse_errors)
    };

    if !parse_errors.is_empty() {
        let count = parse_errors.len();
        report_dsl_errors(
            &source,
            &args.script,
            parse_errors.into_iter().map(DslError::from).collect(),
        );
        eprintln!(
            "{} {} malformed statement(s) skipped",
            "⚠️".yellow(),
            count
        );
    }

    let mut result = value.unwrap_or_else(Document::empty);

    if args.stamp {
        let origin = resolve(args.input.as_ref().unwrap_or(&args.script), cwd);
        let mut context = ProvenanceContext::from_file_with(origin, &config.git());
        let author = args.author.clone().or_else(|| config.author.clone());
        if author.is_some() {
            context.author = author;
        }
        result = stamp(&result, &context);
    }

    let json = if config.pretty && !args.compact {
        result.to_json_pretty()?
    } else {
        result.to_json()?
    };

    match &args.output {
        Some(path) => {
            let path = resolve(path, cwd);
            fs::write(&path, format!("{}\n", json))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(nodes = result.len(), path = %path.display(), "Wrote result");
            eprintln!(
                "{} {} nodes → {}",
                "✓".green(),
                result.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Show lex and parse failures with their source snippet
fn script_failure(source: &str, script: &Path, err: ExecError) -> anyhow::Error {
    match &err {
        ExecError::Lex(e) => report_dsl_errors(source, script, vec![e.clone().into()]),
        ExecError::Parse(e) => report_dsl_errors(source, script, vec![e.clone().into()]),
        _ => {}
    }
    anyhow!(err)
}

/// Attach provenance to top-level nodes.
///
/// Nodes that already carry provenance get a modification record; the rest
/// get fresh provenance from `context`.
fn stamp(document: &Document, context: &ProvenanceContext) -> Document {
    document.map(|node| {
        let provenance = match node.provenance() {
            Some(existing) => existing.with_modification(context.author.as_deref()),
            None => context.create_provenance(),
        };
        Node::clone(node).with_provenance(provenance)
    })
}
