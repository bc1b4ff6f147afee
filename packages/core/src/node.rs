//! # Document Nodes
//!
//! Typed tree nodes for Markdown-like documents.
//!
//! Nodes are built in two phases:
//!
//! ```text
//! constructor         → structural fields + content-derived NodeId
//! with_id / with_*    → identity, provenance and span attached afterwards
//! ```
//!
//! Content never changes in place. Edits return a new node; canonical edits
//! (text, content, code) refresh the NodeId, structural edits (heading
//! level, list ordering, metadata) keep it bit-for-bit.

use crate::error::{NodeError, NodeResult};
use crate::identity::NodeId;
use crate::provenance::Provenance;
use crate::span::SourceSpan;
use serde_json::Value;
use std::collections::BTreeMap;

pub const MIN_HEADING_LEVEL: u8 = 1;
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Free-form key/value data attached to a node
pub type Metadata = BTreeMap<String, Value>;

/// Identity, origin and location data shared by every node variant
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeMeta {
    pub id: Option<NodeId>,
    pub provenance: Option<Provenance>,
    pub source_span: Option<SourceSpan>,
    pub metadata: Metadata,
}

impl NodeMeta {
    /// Meta for an edited copy: provenance records the modification,
    /// span and metadata carry over.
    fn edited(&self, author: Option<&str>) -> Self {
        Self {
            id: self.id.clone(),
            provenance: self
                .provenance
                .as_ref()
                .map(|provenance| provenance.with_modification(author)),
            source_span: self.source_span,
            metadata: self.metadata.clone(),
        }
    }
}

/// Shared builder methods for identity fields
macro_rules! impl_identity_builders {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $ty {
                pub fn id(&self) -> Option<&NodeId> {
                    self.meta.id.as_ref()
                }

                pub fn with_id(mut self, id: NodeId) -> Self {
                    self.meta.id = Some(id);
                    self
                }

                pub fn with_provenance(mut self, provenance: Provenance) -> Self {
                    self.meta.provenance = Some(provenance);
                    self
                }

                pub fn with_source_span(mut self, span: SourceSpan) -> Self {
                    self.meta.source_span = Some(span);
                    self
                }

                /// Attach a metadata entry. Metadata is not part of identity.
                pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
                    self.meta.metadata.insert(key.into(), value);
                    self
                }
            }
        )*
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub(crate) level: u8,
    pub(crate) text: String,
    pub meta: NodeMeta,
}

impl Heading {
    /// Create a heading, clamping `level` into 1..=6
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        let mut heading = Self {
            level: level.clamp(MIN_HEADING_LEVEL, MAX_HEADING_LEVEL),
            text: text.into(),
            meta: NodeMeta::default(),
        };
        heading.meta.id = Some(NodeId::from_node(&heading));
        heading
    }

    /// Create a heading, rejecting levels outside 1..=6
    pub fn try_new(level: u64, text: impl Into<String>) -> NodeResult<Self> {
        match u8::try_from(level) {
            Ok(level) if (MIN_HEADING_LEVEL..=MAX_HEADING_LEVEL).contains(&level) => {
                Ok(Self::new(level, text))
            }
            _ => Err(NodeError::InvalidHeadingLevel(level)),
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn with_text(&self, text: impl Into<String>, author: Option<&str>) -> Self {
        let mut edited = Self {
            level: self.level,
            text: text.into(),
            meta: self.meta.edited(author),
        };
        edited.meta.id = Some(NodeId::from_node(&edited));
        edited
    }

    /// Change the level only. Identity is untouched.
    pub fn with_level(&self, level: u8) -> Self {
        Self {
            level: level.clamp(MIN_HEADING_LEVEL, MAX_HEADING_LEVEL),
            text: self.text.clone(),
            meta: self.meta.clone(),
        }
    }

    pub fn promoted(&self) -> Self {
        self.with_level(self.level.saturating_sub(1))
    }

    pub fn demoted(&self) -> Self {
        self.with_level(self.level.saturating_add(1))
    }
}

/// Content is read through accessors and changed only with `with_*` edits,
/// which recompute the id.
///
/// ```compile_fail
/// let mut paragraph = treekit_core::Paragraph::new("a");
/// paragraph.content = "b".to_string();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub(crate) content: String,
    pub meta: NodeMeta,
}

impl Paragraph {
    pub fn new(content: impl Into<String>) -> Self {
        let mut paragraph = Self {
            content: content.into(),
            meta: NodeMeta::default(),
        };
        paragraph.meta.id = Some(NodeId::from_node(&paragraph));
        paragraph
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn with_content(&self, content: impl Into<String>, author: Option<&str>) -> Self {
        let mut edited = Self {
            content: content.into(),
            meta: self.meta.edited(author),
        };
        edited.meta.id = Some(NodeId::from_node(&edited));
        edited
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub(crate) language: Option<String>,
    pub(crate) code: String,
    pub meta: NodeMeta,
}

impl CodeBlock {
    pub fn new(code: impl Into<String>, language: Option<String>) -> Self {
        let mut block = Self {
            language,
            code: code.into(),
            meta: NodeMeta::default(),
        };
        block.meta.id = Some(NodeId::from_node(&block));
        block
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn with_code(&self, code: impl Into<String>, author: Option<&str>) -> Self {
        let mut edited = Self {
            language: self.language.clone(),
            code: code.into(),
            meta: self.meta.edited(author),
        };
        edited.meta.id = Some(NodeId::from_node(&edited));
        edited
    }

    pub fn with_language(&self, language: Option<String>, author: Option<&str>) -> Self {
        let mut edited = Self {
            language,
            code: self.code.clone(),
            meta: self.meta.edited(author),
        };
        edited.meta.id = Some(NodeId::from_node(&edited));
        edited
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub(crate) content: Vec<Node>,
    pub meta: NodeMeta,
}

impl ListItem {
    pub fn new(content: Vec<Node>) -> Self {
        let mut item = Self {
            content,
            meta: NodeMeta::default(),
        };
        item.meta.id = Some(NodeId::from_node(&item));
        item
    }

    pub fn content(&self) -> &[Node] {
        &self.content
    }

    pub fn with_content(&self, content: Vec<Node>, author: Option<&str>) -> Self {
        let mut edited = Self {
            content,
            meta: self.meta.edited(author),
        };
        edited.meta.id = Some(NodeId::from_node(&edited));
        edited
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub(crate) ordered: bool,
    pub(crate) items: Vec<ListItem>,
    pub meta: NodeMeta,
}

impl List {
    pub fn new(ordered: bool, items: Vec<ListItem>) -> Self {
        let mut list = Self {
            ordered,
            items,
            meta: NodeMeta::default(),
        };
        list.meta.id = Some(NodeId::from_node(&list));
        list
    }

    pub fn ordered(&self) -> bool {
        self.ordered
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    /// Toggle ordered/unordered rendering. Identity is untouched.
    pub fn with_ordered(&self, ordered: bool) -> Self {
        Self {
            ordered,
            items: self.items.clone(),
            meta: self.meta.clone(),
        }
    }

    pub fn with_items(&self, items: Vec<ListItem>, author: Option<&str>) -> Self {
        let mut edited = Self {
            ordered: self.ordered,
            items,
            meta: self.meta.edited(author),
        };
        edited.meta.id = Some(NodeId::from_node(&edited));
        edited
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockQuote {
    pub(crate) content: Vec<Node>,
    pub meta: NodeMeta,
}

impl BlockQuote {
    pub fn new(content: Vec<Node>) -> Self {
        let mut quote = Self {
            content,
            meta: NodeMeta::default(),
        };
        quote.meta.id = Some(NodeId::from_node(&quote));
        quote
    }

    pub fn content(&self) -> &[Node] {
        &self.content
    }

    pub fn with_content(&self, content: Vec<Node>, author: Option<&str>) -> Self {
        let mut edited = Self {
            content,
            meta: self.meta.edited(author),
        };
        edited.meta.id = Some(NodeId::from_node(&edited));
        edited
    }
}

/// A node kind the model has no dedicated variant for.
///
/// Carried through transformations untouched; identity falls back to
/// `lowercase(type_name):text`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownNode {
    pub(crate) type_name: String,
    pub(crate) text: String,
    pub meta: NodeMeta,
}

impl UnknownNode {
    pub fn new(type_name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self {
            type_name: type_name.into(),
            text: text.into(),
            meta: NodeMeta::default(),
        };
        node.meta.id = Some(NodeId::from_node(&node));
        node
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl_identity_builders!(Heading, Paragraph, CodeBlock, ListItem, List, BlockQuote, UnknownNode);

/// Document tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Heading(Heading),
    Paragraph(Paragraph),
    List(List),
    ListItem(ListItem),
    CodeBlock(CodeBlock),
    BlockQuote(BlockQuote),
    Unknown(UnknownNode),
}

impl Node {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Node::Heading(Heading::new(level, text))
    }

    pub fn paragraph(content: impl Into<String>) -> Self {
        Node::Paragraph(Paragraph::new(content))
    }

    pub fn list(ordered: bool, items: Vec<ListItem>) -> Self {
        Node::List(List::new(ordered, items))
    }

    pub fn list_item(content: Vec<Node>) -> Self {
        Node::ListItem(ListItem::new(content))
    }

    pub fn code_block(code: impl Into<String>, language: Option<&str>) -> Self {
        Node::CodeBlock(CodeBlock::new(code, language.map(str::to_string)))
    }

    pub fn block_quote(content: Vec<Node>) -> Self {
        Node::BlockQuote(BlockQuote::new(content))
    }

    pub fn meta(&self) -> &NodeMeta {
        match self {
            Node::Heading(n) => &n.meta,
            Node::Paragraph(n) => &n.meta,
            Node::List(n) => &n.meta,
            Node::ListItem(n) => &n.meta,
            Node::CodeBlock(n) => &n.meta,
            Node::BlockQuote(n) => &n.meta,
            Node::Unknown(n) => &n.meta,
        }
    }

    fn meta_mut(&mut self) -> &mut NodeMeta {
        match self {
            Node::Heading(n) => &mut n.meta,
            Node::Paragraph(n) => &mut n.meta,
            Node::List(n) => &mut n.meta,
            Node::ListItem(n) => &mut n.meta,
            Node::CodeBlock(n) => &mut n.meta,
            Node::BlockQuote(n) => &mut n.meta,
            Node::Unknown(n) => &mut n.meta,
        }
    }

    pub fn id(&self) -> Option<&NodeId> {
        self.meta().id.as_ref()
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.meta().provenance.as_ref()
    }

    pub fn source_span(&self) -> Option<&SourceSpan> {
        self.meta().source_span.as_ref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.meta().metadata
    }

    /// Type tag used in the wire format and in NodeIds
    pub fn node_type(&self) -> &str {
        match self {
            Node::Heading(_) => "heading",
            Node::Paragraph(_) => "paragraph",
            Node::List(_) => "list",
            Node::ListItem(_) => "listitem",
            Node::CodeBlock(_) => "codeblock",
            Node::BlockQuote(_) => "blockquote",
            Node::Unknown(n) => &n.type_name,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Node::Heading(_))
    }

    pub fn as_heading(&self) -> Option<&Heading> {
        match self {
            Node::Heading(heading) => Some(heading),
            _ => None,
        }
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.meta_mut().id = Some(id);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.meta_mut().provenance = Some(provenance);
        self
    }

    pub fn with_source_span(mut self, span: SourceSpan) -> Self {
        self.meta_mut().source_span = Some(span);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta_mut().metadata.insert(key.into(), value);
        self
    }

    /// Attach identity fields to an already-built node in one step.
    ///
    /// `None` arguments leave the existing value in place.
    pub fn attach_identity(
        mut self,
        id: Option<NodeId>,
        provenance: Option<Provenance>,
        source_span: Option<SourceSpan>,
    ) -> Self {
        let meta = self.meta_mut();
        if id.is_some() {
            meta.id = id;
        }
        if provenance.is_some() {
            meta.provenance = provenance;
        }
        if source_span.is_some() {
            meta.source_span = source_span;
        }
        self
    }

    /// Look up a named attribute for predicate matching.
    ///
    /// Variant fields come first, then metadata keys. Returns `None` when the
    /// node has no such attribute.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        let field = match (self, name) {
            (_, "type") => Some(Value::from(self.node_type())),
            (_, "id") => self.id().map(|id| Value::from(id.to_string())),
            (_, "hint") => self.id().map(|id| Value::from(id.hint())),
            (Node::Heading(h), "level") => Some(Value::from(h.level)),
            (Node::Heading(h), "text") => Some(Value::from(h.text.as_str())),
            (Node::Paragraph(p), "content") => Some(Value::from(p.content.as_str())),
            (Node::List(l), "ordered") => Some(Value::from(l.ordered)),
            (Node::CodeBlock(c), "language") => {
                Some(c.language.as_deref().map(Value::from).unwrap_or(Value::Null))
            }
            (Node::CodeBlock(c), "code") => Some(Value::from(c.code.as_str())),
            (Node::Unknown(u), "text") => Some(Value::from(u.text.as_str())),
            _ => None,
        };

        field.or_else(|| self.metadata().get(name).cloned())
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Node {
                fn from(node: $variant) -> Self {
                    Node::$variant(node)
                }
            }
        )*
    };
}

impl_from_variant!(Heading, Paragraph, List, ListItem, CodeBlock, BlockQuote);

impl From<UnknownNode> for Node {
    fn from(node: UnknownNode) -> Self {
        Node::Unknown(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::Provenance;
    use serde_json::json;

    #[test]
    fn test_constructors_assign_ids() {
        let heading = Node::heading(1, "Intro");
        let id = heading.id().expect("heading should have an id");

        assert_eq!(id.node_type(), "heading");
        assert_eq!(id.hint(), "intro");
    }

    #[test]
    fn test_heading_level_is_clamped() {
        assert_eq!(Heading::new(0, "x").level, 1);
        assert_eq!(Heading::new(9, "x").level, 6);
        assert!(Heading::try_new(7, "x").is_err());
        assert!(Heading::try_new(0, "x").is_err());
        assert_eq!(Heading::try_new(3, "x").unwrap().level, 3);
    }

    #[test]
    fn test_promote_demote_boundaries() {
        let top = Heading::new(1, "Top");
        assert_eq!(top.promoted().level, 1);

        let bottom = Heading::new(6, "Bottom");
        assert_eq!(bottom.demoted().level, 6);

        let middle = Heading::new(3, "Middle");
        assert_eq!(middle.promoted().level, 2);
        assert_eq!(middle.demoted().level, 4);
    }

    #[test]
    fn test_level_change_keeps_id() {
        let heading = Heading::new(2, "Stable");
        assert_eq!(heading.promoted().id(), heading.id());
        assert_eq!(heading.demoted().id(), heading.id());
        assert_eq!(heading.with_level(5).id(), heading.id());
    }

    #[test]
    fn test_text_edit_changes_id() {
        let heading = Heading::new(2, "Before");
        let edited = heading.with_text("After", None);

        assert_ne!(edited.id(), heading.id());
        assert_eq!(edited.level, 2);
        assert_eq!(heading.text, "Before");
    }

    #[test]
    fn test_whitespace_only_edit_keeps_id() {
        let heading = Heading::new(2, "Same text");
        let edited = heading.with_text("  Same \t text ", None);
        assert_eq!(edited.id(), heading.id());
    }

    #[test]
    fn test_edit_refreshes_provenance_and_keeps_span() {
        let span = SourceSpan::line(3, 0, 12);
        let paragraph = Paragraph::new("Old content")
            .with_provenance(Provenance::now().with_author("alice"))
            .with_source_span(span);

        let edited = paragraph.with_content("New content", Some("bob"));
        let provenance = edited.meta.provenance.as_ref().unwrap();

        assert_eq!(provenance.author.as_deref(), Some("bob"));
        assert!(provenance.modified_at.is_some());
        assert_eq!(
            provenance.created_at,
            paragraph.meta.provenance.as_ref().unwrap().created_at
        );
        assert_eq!(edited.meta.source_span, Some(span));
    }

    #[test]
    fn test_edit_without_author_keeps_author() {
        let block = CodeBlock::new("fn main() {}", Some("rust".into()))
            .with_provenance(Provenance::now().with_author("alice"));

        let edited = block.with_code("fn main() { run() }", None);
        let provenance = edited.meta.provenance.as_ref().unwrap();
        assert_eq!(provenance.author.as_deref(), Some("alice"));
    }

    #[test]
    fn test_edit_copies_metadata() {
        let paragraph = Paragraph::new("Body").with_metadata("tags", json!(["draft"]));
        let mut edited = paragraph.with_content("Body changed", None);

        edited
            .meta
            .metadata
            .insert("tags".to_string(), json!(["published"]));

        assert_eq!(paragraph.meta.metadata["tags"], json!(["draft"]));
    }

    #[test]
    fn test_metadata_does_not_change_id() {
        let plain = Node::paragraph("Body");
        let tagged = Node::paragraph("Body").with_metadata("status", json!("draft"));
        assert_eq!(plain.id(), tagged.id());
    }

    #[test]
    fn test_list_ordering_keeps_id() {
        let list = List::new(true, vec![ListItem::new(vec![Node::paragraph("one")])]);
        let unordered = list.with_ordered(false);

        assert!(!unordered.ordered);
        assert_eq!(unordered.id(), list.id());
    }

    #[test]
    fn test_code_language_edit_changes_id() {
        let block = CodeBlock::new("print(1)", Some("python".into()));
        let edited = block.with_language(None, None);
        assert_ne!(edited.id(), block.id());
    }

    #[test]
    fn test_attach_identity_keeps_existing_fields() {
        let span = SourceSpan::line(0, 0, 4);
        let node = Node::paragraph("text").attach_identity(None, None, Some(span));

        assert!(node.id().is_some());
        assert_eq!(node.source_span(), Some(&span));
        assert!(node.provenance().is_none());
    }

    #[test]
    fn test_attribute_lookup() {
        let heading = Node::heading(3, "Setup").with_metadata("owner", json!("docs"));

        assert_eq!(heading.attribute("level"), Some(json!(3)));
        assert_eq!(heading.attribute("text"), Some(json!("Setup")));
        assert_eq!(heading.attribute("type"), Some(json!("heading")));
        assert_eq!(heading.attribute("owner"), Some(json!("docs")));
        assert_eq!(heading.attribute("ordered"), None);

        let code = Node::code_block("x", None);
        assert_eq!(code.attribute("language"), Some(Value::Null));
    }
}
