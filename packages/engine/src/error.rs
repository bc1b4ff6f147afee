use thiserror::Error;
use treekit_dsl::{DslError, LexError, ParseError, Position};

pub type OpResult<T> = Result<T, UnsupportedOperationError>;

pub type ExecResult<T> = Result<T, ExecError>;

/// Raised when an operation is asked for a feature it does not implement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{operation}' does not support {feature} yet")]
pub struct UnsupportedOperationError {
    pub operation: String,
    pub feature: String,
}

impl UnsupportedOperationError {
    pub fn new(operation: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            feature: feature.into(),
        }
    }
}

/// Script execution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecError {
    #[error("Unknown operation '{name}' at {position}")]
    UnknownOperation { name: String, position: Position },

    #[error("Undefined variable '{name}' at {position}")]
    UndefinedVariable { name: String, position: Position },

    #[error("Invalid argument for '{operation}' at {position}: {message}")]
    InvalidArgument {
        operation: String,
        message: String,
        position: Position,
    },

    #[error("Operation '{name}' at {position} takes operations and cannot run in a script")]
    NotCallable { name: String, position: Position },

    #[error("{source} (at {position})")]
    Unsupported {
        source: UnsupportedOperationError,
        position: Position,
    },

    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl From<DslError> for ExecError {
    fn from(err: DslError) -> Self {
        match err {
            DslError::Lex(err) => ExecError::Lex(err),
            DslError::Parse(err) => ExecError::Parse(err),
        }
    }
}

impl ExecError {
    pub fn invalid_argument(
        operation: impl Into<String>,
        message: impl Into<String>,
        position: Position,
    ) -> Self {
        ExecError::InvalidArgument {
            operation: operation.into(),
            message: message.into(),
            position,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            ExecError::UnknownOperation { position, .. }
            | ExecError::UndefinedVariable { position, .. }
            | ExecError::InvalidArgument { position, .. }
            | ExecError::NotCallable { position, .. }
            | ExecError::Unsupported { position, .. } => *position,
            ExecError::Lex(err) => err.position(),
            ExecError::Parse(err) => err.position(),
        }
    }
}
