use super::{read_source, report_dsl_errors};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use treekit_dsl::{tokenize, TokenKind};

#[derive(Debug, Args)]
pub struct TokensArgs {
    /// Script to tokenize
    pub script: PathBuf,
}

pub fn tokens(args: TokensArgs, cwd: &str) -> Result<()> {
    let source = read_source(&args.script, cwd)?;

    let tokens = match tokenize(&source) {
        Ok(tokens) => tokens,
        Err(err) => {
            report_dsl_errors(&source, &args.script, vec![err.clone().into()]);
            return Err(anyhow!(err));
        }
    };

    for token in &tokens {
        let position = format!("{}:{}", token.line, token.column);
        let kind = match token.kind {
            TokenKind::Identifier | TokenKind::String | TokenKind::Number => {
                token.kind.name().bright_white()
            }
            TokenKind::Eof => token.kind.name().dimmed(),
            kind if kind.is_keyword() => kind.name().bright_blue(),
            kind => kind.name().yellow(),
        };

        match token.kind {
            TokenKind::Identifier | TokenKind::String | TokenKind::Number => {
                println!("{:>8}  {:<16} {:?}", position.dimmed(), kind, token.value)
            }
            _ => println!("{:>8}  {}", position.dimmed(), kind),
        }
    }

    Ok(())
}
