//! Lexer for treekit pipeline scripts using logos
//!
//! Produces tokens with 1-indexed line/column positions, always terminated
//! by a single [`TokenKind::Eof`]. Whitespace and `#` comments are skipped.
//! The first unrecognized character aborts lexing; recovery is left to the
//! caller.

use crate::error::{LexError, LexResult};
use logos::Logos;
use serde::Serialize;
use std::fmt;

/// Token types for pipeline scripts
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"#[^\n]*")]
pub enum TokenKind {
    // Keywords
    #[token("let")]
    Let,
    #[token("doc")]
    Doc,
    #[token("where")]
    Where,
    #[token("select")]
    Select,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    // Literals
    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    String,

    // A second '.' is left for the next token
    #[regex(r"[0-9]+(\.[0-9]*)?")]
    Number,

    #[token("|")]
    Pipe,

    // Operators
    #[token("=")]
    Equals,
    #[token("!=")]
    NotEquals,
    #[token(">")]
    Greater,
    #[token("<")]
    Less,
    #[token(">=")]
    GreaterEquals,
    #[token("<=")]
    LessEquals,
    #[token("~=")]
    Matches,
    #[token("^=")]
    StartsWith,
    #[token("$=")]
    EndsWith,
    #[token("*=")]
    Contains,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    Eof,
}

impl TokenKind {
    /// Upper-case name used in token dumps
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Let => "LET",
            TokenKind::Doc => "DOC",
            TokenKind::Where => "WHERE",
            TokenKind::Select => "SELECT",
            TokenKind::True | TokenKind::False => "BOOLEAN",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::String => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::Pipe => "PIPE",
            TokenKind::Equals => "EQUALS",
            TokenKind::NotEquals => "NOT_EQUALS",
            TokenKind::Greater => "GREATER",
            TokenKind::Less => "LESS",
            TokenKind::GreaterEquals => "GREATER_EQUALS",
            TokenKind::LessEquals => "LESS_EQUALS",
            TokenKind::Matches => "MATCHES",
            TokenKind::StartsWith => "STARTS_WITH",
            TokenKind::EndsWith => "ENDS_WITH",
            TokenKind::Contains => "CONTAINS",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::Comma => "COMMA",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Eof => "EOF",
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Doc
                | TokenKind::Where
                | TokenKind::Select
                | TokenKind::True
                | TokenKind::False
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte range of a token in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

/// A token with its position.
///
/// `value` holds the source text, except for strings where it holds the
/// unquoted, unescaped contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
    pub column: usize,
    pub span: TokenSpan,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Human-readable description for error messages
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Identifier => format!("identifier '{}'", self.value),
            TokenKind::String => format!("string \"{}\"", self.value),
            TokenKind::Number => format!("number {}", self.value),
            kind if kind.is_keyword() => format!("keyword '{}'", self.value),
            _ => format!("'{}'", self.value),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier | TokenKind::String | TokenKind::Number => {
                write!(f, "{}({:?})", self.kind, self.value)
            }
            kind => write!(f, "{}", kind),
        }
    }
}

/// Maps byte offsets to 1-indexed line/column pairs
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    fn position(&self, source: &str, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = source
            .get(line_start..offset)
            .map(|text| text.chars().count())
            .unwrap_or(0);
        (line, column + 1)
    }
}

/// Decode the body of a quoted string literal
fn unescape(literal: &str) -> String {
    let body = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            // Unknown escapes are kept verbatim
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Streaming lexer. Restart by constructing a new one over the same source.
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
    lines: LineIndex,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            lines: LineIndex::new(source),
            finished: false,
        }
    }

    fn token(&self, kind: TokenKind, range: std::ops::Range<usize>) -> Token {
        let slice = &self.source[range.clone()];
        let value = match kind {
            TokenKind::String => unescape(slice),
            _ => slice.to_string(),
        };
        let (line, column) = self.lines.position(self.source, range.start);

        Token {
            kind,
            value,
            line,
            column,
            span: TokenSpan {
                start: range.start,
                end: range.end,
            },
        }
    }

    fn error(&self, range: std::ops::Range<usize>) -> LexError {
        let character = self.source[range.start..].chars().next().unwrap_or('\0');
        let (line, column) = self.lines.position(self.source, range.start);
        let message = match character {
            '"' | '\'' => "Unterminated string literal".to_string(),
            c => format!("Unexpected character '{}'", c),
        };

        LexError {
            character,
            line,
            column,
            span: TokenSpan {
                start: range.start,
                end: range.end.max(range.start + character.len_utf8()),
            },
            message,
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(Ok(kind)) => Some(Ok(self.token(kind, self.inner.span()))),
            Some(Err(())) => {
                self.finished = true;
                Some(Err(self.error(self.inner.span())))
            }
            None => {
                self.finished = true;
                let end = self.source.len();
                Some(Ok(self.token(TokenKind::Eof, end..end)))
            }
        }
    }
}

/// Lex a whole script, ending with an EOF token
pub fn tokenize(source: &str) -> LexResult<Vec<Token>> {
    Lexer::new(source).collect()
}
