//! Immutable document trees with content-derived node identity.

pub mod document;
pub mod error;
pub mod identity;
pub mod json;
pub mod node;
pub mod normalize;
pub mod provenance;
pub mod span;
pub mod visitor;

pub use document::{Document, OutlineEntry};
pub use error::{NodeError, NodeResult, SerializationError, SerializationResult};
pub use identity::{canonicalize, Canonical, IdentityEngine, NodeId};
pub use node::{
    BlockQuote, CodeBlock, Heading, List, ListItem, Metadata, Node, NodeMeta, Paragraph,
    UnknownNode,
};
pub use provenance::{Git, Provenance, ProvenanceContext, VersionControl};
pub use span::SourceSpan;
pub use visitor::Visitor;
