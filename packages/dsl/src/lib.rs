pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{Assignment, FunctionCall, Pipeline, Position, Statement, Value};
#[cfg(feature = "pretty-errors")]
pub use error::format_errors;
pub use error::{DslError, DslResult, LexError, LexResult, ParseError, ParseResult};
pub use lexer::{tokenize, Lexer, Token, TokenKind, TokenSpan};
pub use parser::{parse, parse_statement, parse_strict, parse_with_errors, Parser};
