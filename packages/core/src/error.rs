//! Error types for the document model

use thiserror::Error;

pub type NodeResult<T> = Result<T, NodeError>;
pub type SerializationResult<T> = Result<T, SerializationError>;

/// Invalid structural values passed to a node constructor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Heading level must be between 1 and 6, got {0}")]
    InvalidHeadingLevel(u64),
}

/// Failure to encode or decode the JSON wire format.
///
/// Every variant names the element that was missing or invalid so the
/// caller can report it without re-inspecting the input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializationError {
    #[error("Malformed JSON: {0}")]
    Syntax(String),

    #[error("Top-level value must be an object")]
    NotAnObject,

    #[error("Missing 'nodes' field")]
    MissingNodes,

    #[error("'nodes' field must be an array")]
    NodesNotArray,

    #[error("Node at {path} must be an object")]
    InvalidNode { path: String },

    #[error("Node at {path} is missing its 'type' field")]
    MissingType { path: String },

    #[error("Unknown node type '{node_type}' at {path}")]
    UnknownType { node_type: String, path: String },

    #[error("Invalid field '{field}' on {node_type} node at {path}: {message}")]
    InvalidField {
        node_type: String,
        field: String,
        path: String,
        message: String,
    },

    #[error("Failed to encode document: {0}")]
    Encode(String),
}

impl SerializationError {
    pub fn invalid_field(
        node_type: impl Into<String>,
        field: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            node_type: node_type.into(),
            field: field.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SerializationError {
    fn from(e: serde_json::Error) -> Self {
        SerializationError::Syntax(e.to_string())
    }
}
