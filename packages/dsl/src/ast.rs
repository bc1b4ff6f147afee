//! Syntax tree for pipeline scripts

use crate::lexer::Token;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// 1-indexed source position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn of(token: &Token) -> Self {
        Self {
            line: token.line,
            column: token.column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Argument value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Bare word such as `heading` in `select heading`
    Identifier(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Identifier(s) => Some(s),
            _ => None,
        }
    }

    /// Key used when the value is passed positionally
    pub fn key(&self) -> String {
        match self {
            Value::String(s) | Value::Identifier(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) | Value::Identifier(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Identifier(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// One pipeline stage, e.g. `where level=2`.
///
/// A single positional value is stored in `arguments` keyed by its own text
/// and also kept in `positional` so callers can tell the two forms apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: BTreeMap<String, Value>,
    pub positional: Vec<Value>,
    pub position: Position,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
            positional: Vec::new(),
            position,
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(key.into(), value);
        self
    }

    pub fn with_positional(mut self, value: Value) -> Self {
        self.arguments.insert(value.key(), value.clone());
        self.positional.push(value);
        self
    }

    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// Keyword arguments, excluding the self-keyed positional entry
    pub fn keyword_arguments(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.arguments.iter().filter(move |(key, value)| {
            !self
                .positional
                .iter()
                .any(|p| &p.key() == *key && p == *value)
        })
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for value in &self.positional {
            write!(f, " {}", value)?;
        }
        let mut first = true;
        for (key, value) in self.keyword_arguments() {
            let sep = if first { " " } else { ", " };
            write!(f, "{}{}={}", sep, key, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Source followed by zero or more stages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipeline {
    /// `doc` or a variable name
    pub source: String,
    pub operations: Vec<FunctionCall>,
    pub position: Position,
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)?;
        for op in &self.operations {
            write!(f, " | {}", op)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub variable: String,
    pub pipeline: Pipeline,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Statement {
    Pipeline(Pipeline),
    Assignment(Assignment),
}

impl Statement {
    pub fn position(&self) -> Position {
        match self {
            Statement::Pipeline(p) => p.position,
            Statement::Assignment(a) => a.position,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        match self {
            Statement::Pipeline(p) => p,
            Statement::Assignment(a) => &a.pipeline,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Pipeline(p) => write!(f, "{}", p),
            Statement::Assignment(a) => write!(f, "let {} = {}", a.variable, a.pipeline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize, column: usize) -> Position {
        Position { line, column }
    }

    #[test]
    fn test_positional_is_self_keyed() {
        let call = FunctionCall::new("select", at(1, 7))
            .with_positional(Value::Identifier("heading".into()));

        assert_eq!(
            call.argument("heading"),
            Some(&Value::Identifier("heading".into()))
        );
        assert_eq!(call.positional.len(), 1);
        assert_eq!(call.keyword_arguments().count(), 0);
    }

    #[test]
    fn test_display_round_trips_shape() {
        let pipeline = Pipeline {
            source: "doc".into(),
            operations: vec![
                FunctionCall::new("select", at(1, 7))
                    .with_positional(Value::Identifier("heading".into())),
                FunctionCall::new("where", at(1, 24))
                    .with_argument("level", Value::Integer(2))
                    .with_argument("text", Value::String("Intro".into())),
                FunctionCall::new("promote", at(1, 50)),
            ],
            position: at(1, 1),
        };

        assert_eq!(
            pipeline.to_string(),
            "doc | select heading | where level=2, text=\"Intro\" | promote"
        );
    }

    #[test]
    fn test_value_json_conversion() {
        assert_eq!(Value::Integer(3).to_json(), serde_json::json!(3));
        assert_eq!(Value::Float(1.5).to_json(), serde_json::json!(1.5));
        assert_eq!(
            Value::Identifier("x".into()).to_json(),
            serde_json::json!("x")
        );
    }
}
