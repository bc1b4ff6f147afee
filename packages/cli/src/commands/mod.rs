pub mod ids;
pub mod ops;
pub mod parse;
pub mod run;
pub mod tokens;

pub use ids::{ids, IdsArgs};
pub use ops::{ops, OpsArgs};
pub use parse::{parse, ParseArgs};
pub use run::{run, RunArgs};
pub use tokens::{tokens, TokensArgs};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use treekit_core::Document;
use treekit_dsl::{format_errors, DslError};

fn resolve(path: &Path, cwd: &str) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        PathBuf::from(cwd).join(path)
    }
}

fn read_source(path: &Path, cwd: &str) -> Result<String> {
    let full = resolve(path, cwd);
    std::fs::read_to_string(&full).with_context(|| format!("Failed to read {}", full.display()))
}

fn load_document(path: &Path, cwd: &str) -> Result<Document> {
    let content = read_source(path, cwd)?;
    Document::from_json(&content).with_context(|| format!("Invalid document {}", path.display()))
}

/// Render lex/parse errors with source snippets on stderr
fn report_dsl_errors(source: &str, path: &Path, errors: Vec<DslError>) {
    if errors.is_empty() {
        return;
    }
    let filename = path.display().to_string();
    eprint!("{}", format_errors(source, &filename, &errors));
}
