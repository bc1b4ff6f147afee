//! Content-derived node identity
//!
//! A [`NodeId`] is computed from a node's canonical form only: the parts of
//! the node that carry meaning. Position in the document, heading level,
//! list ordering and metadata never feed into it, so an id survives moves
//! and cosmetic restructuring but changes when the text does.
//!
//! Canonical forms are legible tagged strings. Containers concatenate the
//! canonical strings of their children rather than hashing child ids:
//!
//! ```text
//! list:listitem:paragraph:firstlistitem:paragraph:second
//! ```

use crate::node::{BlockQuote, CodeBlock, Heading, List, ListItem, Node, Paragraph, UnknownNode};
use crate::normalize::{normalize_text, slugify, HINT_MAX_LEN};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Number of hash characters used for equality and display
pub const SHORT_HASH_LEN: usize = 16;

/// Length of a full SHA-256 hex digest
pub const FULL_HASH_LEN: usize = 64;

/// Paragraph hints are built from this many leading characters
const PARAGRAPH_HINT_CHARS: usize = 50;

/// Stable identity of a node.
///
/// The full 64-character SHA-256 digest is stored, but equality, hashing
/// and the string form use only its first [`SHORT_HASH_LEN`] characters.
/// The hint is cosmetic and never compared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeId {
    content_hash: String,
    hint: String,
    node_type: String,
}

impl NodeId {
    pub fn new(
        content_hash: impl Into<String>,
        hint: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Self {
        Self {
            content_hash: content_hash.into(),
            hint: hint.into(),
            node_type: node_type.into(),
        }
    }

    /// Compute the id of a node from its canonical form
    pub fn from_node<T: Canonical + ?Sized>(node: &T) -> Self {
        let canonical = node.canonical_form();
        Self::new(sha256_hex(canonical.as_bytes()), node.hint(), node.type_tag())
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// The compared prefix of the content hash
    pub fn short_hash(&self) -> &str {
        self.content_hash
            .get(..SHORT_HASH_LEN)
            .unwrap_or(&self.content_hash)
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// True when the hash is a full lowercase hex SHA-256 digest
    pub fn has_full_hash(&self) -> bool {
        self.content_hash.len() == FULL_HASH_LEN
            && self
                .content_hash
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl PartialEq for NodeId {
    fn eq(&self, other: &Self) -> bool {
        self.short_hash() == other.short_hash()
    }
}

impl Eq for NodeId {}

impl Hash for NodeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.short_hash().hash(state);
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.node_type, self.hint, self.short_hash())
    }
}

/// Something with a canonical form the identity engine can hash.
pub trait Canonical {
    /// Lowercase tag embedded in the canonical form and the NodeId
    fn type_tag(&self) -> String;

    /// Normalized string of the semantically significant content
    fn canonical_form(&self) -> String;

    /// Readable slug; defaults to the type tag
    fn hint(&self) -> String {
        self.type_tag()
    }
}

impl Canonical for Heading {
    fn type_tag(&self) -> String {
        "heading".to_string()
    }

    fn canonical_form(&self) -> String {
        format!("heading:{}", normalize_text(&self.text))
    }

    fn hint(&self) -> String {
        slugify(&normalize_text(&self.text), "heading")
    }
}

impl Canonical for Paragraph {
    fn type_tag(&self) -> String {
        "paragraph".to_string()
    }

    fn canonical_form(&self) -> String {
        format!("paragraph:{}", normalize_text(&self.content))
    }

    fn hint(&self) -> String {
        let normalized = normalize_text(&self.content);
        let lead: String = normalized.chars().take(PARAGRAPH_HINT_CHARS).collect();
        slugify(&lead, "paragraph")
    }
}

impl Canonical for CodeBlock {
    fn type_tag(&self) -> String {
        "codeblock".to_string()
    }

    // Code is hashed verbatim; whitespace is significant there
    fn canonical_form(&self) -> String {
        format!(
            "codeblock:{}:{}",
            self.language.as_deref().unwrap_or(""),
            self.code
        )
    }

    fn hint(&self) -> String {
        match self.language.as_deref() {
            Some(language) if !language.is_empty() => {
                language.chars().take(HINT_MAX_LEN).collect()
            }
            _ => "codeblock".to_string(),
        }
    }
}

impl Canonical for ListItem {
    fn type_tag(&self) -> String {
        "listitem".to_string()
    }

    fn canonical_form(&self) -> String {
        let mut out = String::from("listitem:");
        for child in &self.content {
            out.push_str(&child.canonical_form());
        }
        out
    }
}

impl Canonical for List {
    fn type_tag(&self) -> String {
        "list".to_string()
    }

    fn canonical_form(&self) -> String {
        let mut out = String::from("list:");
        for item in &self.items {
            out.push_str(&item.canonical_form());
        }
        out
    }
}

impl Canonical for BlockQuote {
    fn type_tag(&self) -> String {
        "blockquote".to_string()
    }

    fn canonical_form(&self) -> String {
        let mut out = String::from("blockquote:");
        for child in &self.content {
            out.push_str(&child.canonical_form());
        }
        out
    }
}

impl Canonical for UnknownNode {
    fn type_tag(&self) -> String {
        self.type_name.to_lowercase()
    }

    fn canonical_form(&self) -> String {
        format!("{}:{}", self.type_tag(), self.text)
    }
}

impl Canonical for Node {
    fn type_tag(&self) -> String {
        match self {
            Node::Heading(n) => n.type_tag(),
            Node::Paragraph(n) => n.type_tag(),
            Node::List(n) => n.type_tag(),
            Node::ListItem(n) => n.type_tag(),
            Node::CodeBlock(n) => n.type_tag(),
            Node::BlockQuote(n) => n.type_tag(),
            Node::Unknown(n) => n.type_tag(),
        }
    }

    fn canonical_form(&self) -> String {
        match self {
            Node::Heading(n) => n.canonical_form(),
            Node::Paragraph(n) => n.canonical_form(),
            Node::List(n) => n.canonical_form(),
            Node::ListItem(n) => n.canonical_form(),
            Node::CodeBlock(n) => n.canonical_form(),
            Node::BlockQuote(n) => n.canonical_form(),
            Node::Unknown(n) => n.canonical_form(),
        }
    }

    fn hint(&self) -> String {
        match self {
            Node::Heading(n) => n.hint(),
            Node::Paragraph(n) => n.hint(),
            Node::List(n) => n.hint(),
            Node::ListItem(n) => n.hint(),
            Node::CodeBlock(n) => n.hint(),
            Node::BlockQuote(n) => n.hint(),
            Node::Unknown(n) => n.hint(),
        }
    }
}

/// Canonical string of a node
pub fn canonicalize(node: &Node) -> String {
    node.canonical_form()
}

/// Lowercase hex SHA-256 digest
pub fn sha256_hex(data: &[u8]) -> String {
    use std::fmt::Write as _;
    let digest = Sha256::digest(data);
    let mut hex = String::with_capacity(64);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Identity computation with an explicit memoization cache.
///
/// Entries are keyed by canonical form, so a cached id can never go stale
/// for a different node. The cache uses a `RefCell` and the engine is not
/// `Sync`; give each worker thread its own engine.
#[derive(Debug, Default)]
pub struct IdentityEngine {
    cache: RefCell<HashMap<String, NodeId>>,
}

impl IdentityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_node<T: Canonical + ?Sized>(&self, node: &T) -> NodeId {
        let canonical = node.canonical_form();
        if let Some(id) = self.cache.borrow().get(&canonical) {
            return id.clone();
        }

        let id = NodeId::new(sha256_hex(canonical.as_bytes()), node.hint(), node.type_tag());
        self.cache.borrow_mut().insert(canonical, id.clone());
        id
    }

    pub fn canonicalize(&self, node: &Node) -> String {
        canonicalize(node)
    }

    /// Drop every memoized id
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let id = NodeId::from_node(&Heading::new(1, "Getting Started"));
        let display = id.to_string();
        let parts: Vec<&str> = display.split(':').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "heading");
        assert_eq!(parts[1], "getting-started");
        assert_eq!(parts[2].len(), SHORT_HASH_LEN);
        assert_eq!(id.content_hash().len(), 64);
    }

    #[test]
    fn test_hash_is_lowercase_hex() {
        let id = NodeId::from_node(&Paragraph::new("hello"));
        assert!(id
            .content_hash()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(id.has_full_hash());
        assert!(!NodeId::new("ABC", "x", "paragraph").has_full_hash());
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_equality_uses_prefix_only() {
        let a = NodeId::new("0123456789abcdef0000000000000000", "a", "heading");
        let b = NodeId::new("0123456789abcdefffffffffffffffff", "b", "paragraph");
        let c = NodeId::new("1123456789abcdef0000000000000000", "a", "heading");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_canonical_forms_are_tagged() {
        let list = Node::list(
            false,
            vec![
                ListItem::new(vec![Node::paragraph("first")]),
                ListItem::new(vec![Node::paragraph("second")]),
            ],
        );

        assert_eq!(
            canonicalize(&list),
            "list:listitem:paragraph:firstlistitem:paragraph:second"
        );
        assert_eq!(canonicalize(&Node::heading(4, " A  b ")), "heading:A b");
        assert_eq!(
            canonicalize(&Node::code_block("  x = 1\n", Some("py"))),
            "codeblock:py:  x = 1\n"
        );
    }

    #[test]
    fn test_heading_and_paragraph_with_same_text_differ() {
        assert_ne!(Node::heading(1, "Same").id(), Node::paragraph("Same").id());
    }

    #[test]
    fn test_code_whitespace_is_significant() {
        let a = Node::code_block("x = 1", Some("py"));
        let b = Node::code_block("x  = 1", Some("py"));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_hints() {
        assert_eq!(Node::code_block("x", Some("rust")).id().unwrap().hint(), "rust");
        assert_eq!(Node::code_block("x", None).id().unwrap().hint(), "codeblock");
        assert_eq!(Node::heading(1, "???").id().unwrap().hint(), "heading");
        assert_eq!(Node::paragraph("").id().unwrap().hint(), "paragraph");
        assert_eq!(Node::list(true, vec![]).id().unwrap().hint(), "list");
        assert_eq!(Node::block_quote(vec![]).id().unwrap().hint(), "blockquote");
    }

    #[test]
    fn test_code_language_hint_is_capped() {
        let language = "x".repeat(40);
        let node = Node::code_block("x", Some(language.as_str()));
        let id = node.id().unwrap();
        assert_eq!(id.hint().chars().count(), HINT_MAX_LEN);
    }

    #[test]
    fn test_unknown_node_fallback() {
        let node = Node::Unknown(UnknownNode::new("Table", "| a | b |"));
        let id = node.id().unwrap();

        assert_eq!(canonicalize(&node), "table:| a | b |");
        assert_eq!(id.hint(), "table");
        assert_eq!(id.node_type(), "table");
    }

    #[test]
    fn test_engine_cache_and_clear() {
        let engine = IdentityEngine::new();
        let heading = Node::heading(2, "Cached");

        let first = engine.from_node(&heading);
        let second = engine.from_node(&heading);
        assert_eq!(first, second);
        assert_eq!(engine.cache_len(), 1);

        // Level is not part of the canonical form, so this is a cache hit
        engine.from_node(&Node::heading(5, "Cached"));
        assert_eq!(engine.cache_len(), 1);

        engine.clear_cache();
        assert_eq!(engine.cache_len(), 0);
        assert_eq!(engine.from_node(&heading), first);
    }

    #[test]
    fn test_engine_matches_uncached() {
        let engine = IdentityEngine::new();
        let quote = Node::block_quote(vec![Node::paragraph("quoted")]);
        assert_eq!(engine.from_node(&quote), NodeId::from_node(&quote));
        assert_eq!(Some(&engine.from_node(&quote)), quote.id());
    }
}
