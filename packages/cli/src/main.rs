mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{ids, ops, parse, run, tokens, IdsArgs, OpsArgs, ParseArgs, RunArgs, TokensArgs};
use tracing_subscriber::EnvFilter;

/// treekit - content-addressed document trees and pipeline scripts
#[derive(Parser, Debug)]
#[command(name = "treekit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a pipeline script against a document
    Run(RunArgs),

    /// Print the tokens of a script
    Tokens(TokensArgs),

    /// Print the syntax tree of a script
    Parse(ParseArgs),

    /// Print node ids of a document, depth-first
    Ids(IdsArgs),

    /// List available operations
    Ops(OpsArgs),
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run(args) => run(args, &cwd),
        Command::Tokens(args) => tokens(args, &cwd),
        Command::Parse(args) => parse(args, &cwd),
        Command::Ids(args) => ids(args, &cwd),
        Command::Ops(args) => ops(args),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
