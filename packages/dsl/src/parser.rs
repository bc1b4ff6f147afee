//! Recursive descent parser for pipeline scripts
//!
//! Grammar:
//!
//! ```text
//! program    := statement ((';' | newline) statement)*
//! statement  := assignment | pipeline
//! assignment := 'let' IDENTIFIER '=' pipeline
//! pipeline   := ('doc' | IDENTIFIER) ('|' call)*
//! call       := name (kwargs | value)?
//! kwargs     := IDENTIFIER '=' value (',' IDENTIFIER '=' value)*
//! value      := STRING | NUMBER | 'true' | 'false' | IDENTIFIER
//! ```
//!
//! Arguments must start on the same line as the operation name, so a
//! variable on the next line always begins a new statement.

use crate::ast::{Assignment, FunctionCall, Pipeline, Position, Statement, Value};
use crate::error::{DslResult, LexResult, ParseError, ParseResult};
use crate::lexer::{tokenize, Token, TokenKind, TokenSpan};
use std::collections::BTreeMap;
use tracing::debug;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let (line, column, end) = tokens
                .last()
                .map(|t| (t.line, t.column + t.value.chars().count(), t.span.end))
                .unwrap_or((1, 1, 0));
            tokens.push(Token {
                kind: TokenKind::Eof,
                value: String::new(),
                line,
                column,
                span: TokenSpan { start: end, end },
            });
        }

        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    pub fn from_source(source: &str) -> LexResult<Self> {
        Ok(Self::new(tokenize(source)?))
    }

    /// Errors recorded by [`Parser::parse`]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    /// Parse every statement, skipping malformed ones.
    ///
    /// Errors never escape; they are kept in [`Parser::errors`].
    pub fn parse(&mut self) -> Vec<Statement> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.match_token(TokenKind::Semicolon) {
                continue;
            }

            let start = self.pos;
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(err) => {
                    debug!(error = %err, "Skipping malformed statement");
                    self.errors.push(err);
                    self.synchronize(start);
                }
            }
        }

        statements
    }

    /// Parse one statement including its terminator
    pub fn parse_statement(&mut self) -> ParseResult<Statement> {
        let statement = if self.check(TokenKind::Let) {
            Statement::Assignment(self.parse_assignment()?)
        } else {
            Statement::Pipeline(self.parse_pipeline()?)
        };
        self.expect_statement_end()?;
        Ok(statement)
    }

    fn parse_assignment(&mut self) -> ParseResult<Assignment> {
        let position = Position::of(self.peek());
        self.expect(TokenKind::Let, "'let'")?;
        let variable = self.expect_identifier("variable name")?;
        self.expect(TokenKind::Equals, "'='")?;
        let pipeline = self.parse_pipeline()?;

        Ok(Assignment {
            variable,
            pipeline,
            position,
        })
    }

    pub fn parse_pipeline(&mut self) -> ParseResult<Pipeline> {
        let token = self.peek().clone();
        let source = match token.kind {
            TokenKind::Doc | TokenKind::Identifier => token.value.clone(),
            _ => return Err(ParseError::unexpected("'doc' or a variable name", &token)),
        };
        self.advance();

        let mut operations = Vec::new();
        while self.match_token(TokenKind::Pipe) {
            operations.push(self.parse_call()?);
        }

        Ok(Pipeline {
            source,
            operations,
            position: Position::of(&token),
        })
    }

    fn parse_call(&mut self) -> ParseResult<FunctionCall> {
        let name_token = self.peek().clone();
        match name_token.kind {
            TokenKind::Identifier | TokenKind::Select | TokenKind::Where => {}
            _ => return Err(ParseError::unexpected("operation name", &name_token)),
        }
        self.advance();

        let mut call = FunctionCall {
            name: name_token.value.clone(),
            arguments: BTreeMap::new(),
            positional: Vec::new(),
            position: Position::of(&name_token),
        };

        if self.peek().line != name_token.line {
            return Ok(call);
        }

        if self.check(TokenKind::Identifier) && self.check_ahead(1, TokenKind::Equals) {
            loop {
                let key = self.expect_identifier("argument name")?;
                let equals = self.peek().clone();
                self.expect(TokenKind::Equals, "'='")?;
                if self.check(TokenKind::Eof) || self.peek().line != equals.line {
                    return Err(ParseError::missing("value", &equals));
                }
                let value = self.parse_value()?;
                // Repeated keys: last one wins
                call.arguments.insert(key, value);

                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        } else if self.is_value_start() {
            let value = self.parse_value()?;
            call.arguments.insert(value.key(), value.clone());
            call.positional.push(value);
        }

        Ok(call)
    }

    fn parse_value(&mut self) -> ParseResult<Value> {
        let token = self.peek().clone();
        let value = match token.kind {
            TokenKind::String => Value::String(token.value.clone()),
            TokenKind::Number => Self::parse_number(&token)?,
            TokenKind::True => Value::Boolean(true),
            TokenKind::False => Value::Boolean(false),
            TokenKind::Identifier => Value::Identifier(token.value.clone()),
            _ => return Err(ParseError::unexpected("value", &token)),
        };
        self.advance();
        Ok(value)
    }

    fn parse_number(token: &Token) -> ParseResult<Value> {
        if let Ok(i) = token.value.parse::<i64>() {
            return Ok(Value::Integer(i));
        }
        token
            .value
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ParseError::invalid(token, format!("invalid number '{}'", token.value)))
    }

    fn is_value_start(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::String
                | TokenKind::Number
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Identifier
        )
    }

    /// A statement ends at `;`, EOF, or a line break
    fn expect_statement_end(&mut self) -> ParseResult<()> {
        if self.is_at_end() || self.match_token(TokenKind::Semicolon) {
            return Ok(());
        }
        let token = self.peek();
        if self.pos > 0 && token.line > self.tokens[self.pos - 1].line {
            return Ok(());
        }
        Err(ParseError::unexpected("'|', ';' or end of line", token))
    }

    /// Skip to the next plausible statement start.
    ///
    /// Stops after a `;`, or before a `let`, `doc` or identifier that opens a
    /// line. Always consumes at least one token.
    fn synchronize(&mut self, start: usize) {
        if self.pos == start {
            self.advance();
        }

        while !self.is_at_end() {
            if self.match_token(TokenKind::Semicolon) {
                return;
            }
            if self.at_line_start()
                && matches!(
                    self.peek().kind,
                    TokenKind::Let | TokenKind::Doc | TokenKind::Identifier
                )
            {
                return;
            }
            self.advance();
        }
    }

    fn at_line_start(&self) -> bool {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(previous) => previous.line < self.peek().line,
            None => true,
        }
    }

    // Helper methods

    fn peek(&self) -> &Token {
        // new() guarantees a trailing EOF
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn check_ahead(&self, offset: usize, kind: TokenKind) -> bool {
        self.tokens
            .get(self.pos + offset)
            .map_or(false, |t| t.kind == kind)
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(expected, self.peek()))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> ParseResult<String> {
        if self.check(TokenKind::Identifier) {
            let value = self.peek().value.clone();
            self.advance();
            Ok(value)
        } else {
            Err(ParseError::unexpected(expected, self.peek()))
        }
    }
}

/// Parse a script, dropping malformed statements
pub fn parse(source: &str) -> LexResult<Vec<Statement>> {
    parse_with_errors(source).map(|(statements, _)| statements)
}

/// Parse a script, returning recovered statements and the errors skipped
pub fn parse_with_errors(source: &str) -> LexResult<(Vec<Statement>, Vec<ParseError>)> {
    let mut parser = Parser::from_source(source)?;
    let statements = parser.parse();
    Ok((statements, parser.take_errors()))
}

/// Parse a script that must be free of errors
pub fn parse_strict(source: &str) -> DslResult<Vec<Statement>> {
    let mut parser = Parser::from_source(source)?;
    let statements = parser.parse();
    match parser.take_errors().into_iter().next() {
        Some(err) => Err(err.into()),
        None => Ok(statements),
    }
}

/// Parse exactly one statement
pub fn parse_statement(source: &str) -> DslResult<Statement> {
    let mut parser = Parser::from_source(source)?;
    let statement = parser.parse_statement()?;
    if !parser.is_at_end() {
        return Err(ParseError::unexpected("end of input", parser.peek()).into());
    }
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Vec<Statement> {
        let (statements, errors) = parse_with_errors(source).expect("Failed to tokenize");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        statements
    }

    fn only_pipeline(source: &str) -> Pipeline {
        let mut statements = parse_ok(source);
        assert_eq!(statements.len(), 1);
        match statements.remove(0) {
            Statement::Pipeline(p) => p,
            other => panic!("expected pipeline, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_doc() {
        let pipeline = only_pipeline("doc");
        assert_eq!(pipeline.source, "doc");
        assert!(pipeline.operations.is_empty());
    }

    #[test]
    fn test_select_positional() {
        let pipeline = only_pipeline("doc | select heading");
        let call = &pipeline.operations[0];

        assert_eq!(call.name, "select");
        assert_eq!(
            call.arguments.get("heading"),
            Some(&Value::Identifier("heading".into()))
        );
        assert_eq!(call.positional, vec![Value::Identifier("heading".into())]);
    }

    #[test]
    fn test_keyword_arguments() {
        let pipeline = only_pipeline(r#"doc | where level=2, text="Intro", draft=false"#);
        let call = &pipeline.operations[0];

        assert_eq!(call.name, "where");
        assert_eq!(call.arguments.get("level"), Some(&Value::Integer(2)));
        assert_eq!(
            call.arguments.get("text"),
            Some(&Value::String("Intro".into()))
        );
        assert_eq!(call.arguments.get("draft"), Some(&Value::Boolean(false)));
        assert!(call.positional.is_empty());
    }

    #[test]
    fn test_numbers_prefer_integers() {
        let pipeline = only_pipeline("doc | where a=3, b=2.5, c=4.");
        let args = &pipeline.operations[0].arguments;
        assert_eq!(args["a"], Value::Integer(3));
        assert_eq!(args["b"], Value::Float(2.5));
        assert_eq!(args["c"], Value::Float(4.0));
    }

    #[test]
    fn test_assignment_then_use() {
        let statements = parse_ok("let h = doc | select heading\nh | promote");
        assert_eq!(statements.len(), 2);

        match &statements[0] {
            Statement::Assignment(a) => {
                assert_eq!(a.variable, "h");
                assert_eq!(a.pipeline.source, "doc");
                assert_eq!(a.pipeline.operations.len(), 1);
            }
            other => panic!("expected assignment, got {:?}", other),
        }
        assert_eq!(statements[1].pipeline().source, "h");
        assert_eq!(statements[1].position(), Position { line: 2, column: 1 });
    }

    #[test]
    fn test_multiline_pipeline() {
        let pipeline = only_pipeline("doc\n  | select heading\n  | promote");
        assert_eq!(pipeline.operations.len(), 2);
        assert_eq!(pipeline.operations[1].position, Position { line: 3, column: 5 });
    }

    #[test]
    fn test_arguments_do_not_cross_lines() {
        let statements = parse_ok("doc | promote\nx | demote");
        assert_eq!(statements.len(), 2);
        assert!(statements[0].pipeline().operations[0].arguments.is_empty());
        assert_eq!(statements[1].pipeline().source, "x");
    }

    #[test]
    fn test_semicolon_separates_statements() {
        let statements = parse_ok("doc | promote; doc | demote;");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_ok("").is_empty());
        assert!(parse_ok("# only a comment\n").is_empty());
    }

    #[test]
    fn test_where_keyword_needs_operation_position() {
        let (statements, errors) = parse_with_errors("where level=2").unwrap();
        assert!(statements.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].token().kind, TokenKind::Where);
    }

    #[test]
    fn test_recovers_at_next_line() {
        let source = "doc | where level=\ndoc | select heading";
        let (statements, errors) = parse_with_errors(source).unwrap();

        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].pipeline().operations[0].name, "select");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ParseError::MissingValue { .. }));
        assert_eq!(errors[0].position(), Position { line: 1, column: 19 });
    }

    #[test]
    fn test_recovers_after_semicolon() {
        let (statements, errors) = parse_with_errors("doc | = bad; doc | promote").unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_trailing_garbage_on_same_line_is_error() {
        let (statements, errors) = parse_with_errors("doc | select heading extra").unwrap();
        assert!(statements.is_empty());
        assert_eq!(errors[0].token().value, "extra");
    }

    #[test]
    fn test_stray_pipe_is_skipped() {
        let (statements, errors) = parse_with_errors("| promote\ndoc").unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_parse_strict_reports_first_error() {
        let err = parse_strict("doc | where level=,").unwrap_err();
        assert_eq!(err.position(), Position { line: 1, column: 19 });
    }

    #[test]
    fn test_parse_statement_rejects_trailing_input() {
        assert!(parse_statement("doc | promote").is_ok());
        assert!(parse_statement("doc | promote\ndoc").is_err());
    }

    #[test]
    fn test_lex_error_propagates() {
        assert!(parse("doc | select @").is_err());
    }

    #[test]
    fn test_new_appends_missing_eof() {
        let mut tokens = tokenize("doc").unwrap();
        tokens.pop();
        let mut parser = Parser::new(tokens);
        assert_eq!(parser.parse().len(), 1);
        assert!(parser.errors().is_empty());
    }
}
