//! Error types for the pipeline DSL

use crate::ast::Position;
use crate::lexer::{Token, TokenSpan};
use thiserror::Error;

pub type LexResult<T> = Result<T, LexError>;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

pub type DslResult<T> = Result<T, DslError>;

/// First character the lexer could not match
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct LexError {
    pub character: char,
    pub line: usize,
    pub column: usize,
    pub span: TokenSpan,
    pub message: String,
}

impl LexError {
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }
}

/// Parse error carrying the offending token
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(
        "Unexpected token at line {}, column {}: expected {expected}, found {}",
        .found.line,
        .found.column,
        .found.describe()
    )]
    UnexpectedToken { expected: String, found: Token },

    #[error("Invalid syntax at line {}, column {}: {message}", .token.line, .token.column)]
    InvalidSyntax { token: Token, message: String },

    /// Nothing followed `after` on its line
    #[error(
        "Missing {expected} at line {}, column {} after '{}'",
        .after.line,
        end_column(.after),
        .after.value
    )]
    MissingValue { expected: String, after: Token },
}

fn end_column(token: &Token) -> usize {
    token.column + token.value.chars().count()
}

impl ParseError {
    pub fn unexpected(expected: impl Into<String>, found: &Token) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.clone(),
        }
    }

    pub fn invalid(token: &Token, message: impl Into<String>) -> Self {
        ParseError::InvalidSyntax {
            token: token.clone(),
            message: message.into(),
        }
    }

    pub fn missing(expected: impl Into<String>, after: &Token) -> Self {
        ParseError::MissingValue {
            expected: expected.into(),
            after: after.clone(),
        }
    }

    pub fn token(&self) -> &Token {
        match self {
            ParseError::UnexpectedToken { found, .. } => found,
            ParseError::InvalidSyntax { token, .. } => token,
            ParseError::MissingValue { after, .. } => after,
        }
    }

    /// Where the error points: the offending token, or just past `after`
    pub fn position(&self) -> Position {
        match self {
            ParseError::MissingValue { after, .. } => Position {
                line: after.line,
                column: end_column(after),
            },
            _ => Position::of(self.token()),
        }
    }

    pub fn span(&self) -> TokenSpan {
        match self {
            ParseError::MissingValue { after, .. } => TokenSpan {
                start: after.span.end,
                end: after.span.end,
            },
            _ => self.token().span,
        }
    }
}

/// Any failure turning source text into statements
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DslError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl DslError {
    pub fn span(&self) -> TokenSpan {
        match self {
            DslError::Lex(err) => err.span,
            DslError::Parse(err) => err.span(),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            DslError::Lex(err) => err.position(),
            DslError::Parse(err) => err.position(),
        }
    }

    fn label(&self) -> String {
        match self {
            DslError::Lex(err) => err.message.clone(),
            DslError::Parse(ParseError::UnexpectedToken { expected, .. })
            | DslError::Parse(ParseError::MissingValue { expected, .. }) => {
                format!("expected {}", expected)
            }
            DslError::Parse(ParseError::InvalidSyntax { message, .. }) => message.clone(),
        }
    }
}

/// Pretty-print errors with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_errors(source: &str, filename: &str, errors: &[DslError]) -> String {
    use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};

    let mut output = Vec::new();

    for error in errors {
        let span = error.span();
        let range = label_range(source, span.start, span.end);

        // Token spans are byte offsets
        let report = Report::build(ReportKind::Error, filename, range.start)
            .with_config(Config::default().with_index_type(IndexType::Byte))
            .with_message(error.to_string())
            .with_label(
                Label::new((filename, range))
                    .with_color(Color::Red)
                    .with_message(error.label()),
            )
            .finish();

        if report
            .write((filename, Source::from(source)), &mut output)
            .is_err()
        {
            output.extend_from_slice(format!("{}\n", error).as_bytes());
        }
    }

    String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
}

/// Byte range for a label. Zero-width spans (EOF) are widened to the
/// character they sit on, or the last character of the source.
#[cfg(feature = "pretty-errors")]
fn label_range(source: &str, start: usize, end: usize) -> std::ops::Range<usize> {
    let start = start.min(source.len());
    if end > start {
        return start..end.min(source.len());
    }

    let following = source.get(start..).and_then(|rest| rest.chars().next());
    match following {
        Some(c) => start..start + c.len_utf8(),
        None => match source.char_indices().next_back() {
            Some((i, c)) => i..i + c.len_utf8(),
            None => 0..0,
        },
    }
}
