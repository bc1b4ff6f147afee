//! # Document
//!
//! Ordered sequence of top-level nodes plus an index from [`NodeId`] to node
//! position. Documents never change after construction: `filter`, `map`,
//! `union` and friends return a new document whose index is rebuilt from
//! scratch, so entries for removed nodes cannot linger.

use crate::error::SerializationResult;
use crate::identity::NodeId;
use crate::json;
use crate::node::*;
use crate::visitor::{walk_block_quote, walk_list, walk_list_item, Visitor};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
}

/// Build the id index in one pass. Nodes without an id are skipped; with
/// duplicate ids the later node wins.
fn build_index(nodes: &[Node]) -> HashMap<NodeId, usize> {
    nodes
        .iter()
        .enumerate()
        .filter_map(|(position, node)| node.id().map(|id| (id.clone(), position)))
        .collect()
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        let index = build_index(&nodes);
        Self { nodes, index }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Node> {
        self.nodes.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// Look up a top-level node by id
    pub fn find_node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).and_then(|&position| self.nodes.get(position))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Top-level nodes matching `predicate`, order preserved
    pub fn find_nodes<P>(&self, predicate: P) -> Document
    where
        P: Fn(&Node) -> bool,
    {
        self.filter(predicate)
    }

    pub fn filter<P>(&self, predicate: P) -> Document
    where
        P: Fn(&Node) -> bool,
    {
        self.nodes
            .iter()
            .filter(|node| predicate(node))
            .cloned()
            .collect()
    }

    pub fn map<F>(&self, transform: F) -> Document
    where
        F: Fn(&Node) -> Node,
    {
        self.nodes.iter().map(transform).collect()
    }

    /// Like [`Document::map`] for transforms that can fail
    pub fn try_map<F, E>(&self, transform: F) -> Result<Document, E>
    where
        F: Fn(&Node) -> Result<Node, E>,
    {
        let nodes = self.nodes.iter().map(transform).collect::<Result<Vec<_>, E>>()?;
        Ok(Document::new(nodes))
    }

    /// Nodes of `self` followed by nodes of `other`, duplicates kept
    pub fn union(&self, other: &Document) -> Document {
        self.nodes.iter().chain(other.nodes.iter()).cloned().collect()
    }

    /// Visit every node depth-first, top-level nodes in order
    pub fn walk<V: Visitor>(&self, visitor: &mut V) {
        for node in &self.nodes {
            visitor.visit_node(node);
        }
    }

    /// Ids of every node in the tree, pre-order
    pub fn all_ids(&self) -> Vec<NodeId> {
        let mut collector = IdCollector::default();
        self.walk(&mut collector);
        collector.ids
    }

    /// Headings anywhere in the tree, in document order
    pub fn outline(&self) -> Vec<OutlineEntry> {
        let mut builder = OutlineBuilder::default();
        self.walk(&mut builder);
        builder.entries
    }

    pub fn to_json(&self) -> SerializationResult<String> {
        json::to_json(self)
    }

    pub fn to_json_pretty(&self) -> SerializationResult<String> {
        json::to_json_pretty(self)
    }

    pub fn from_json(input: &str) -> SerializationResult<Document> {
        json::from_json(input)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl FromIterator<Node> for Document {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Document::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl IntoIterator for Document {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

/// One heading in a document outline
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
    pub id: Option<NodeId>,
}

#[derive(Default)]
struct OutlineBuilder {
    entries: Vec<OutlineEntry>,
}

impl Visitor for OutlineBuilder {
    fn visit_heading(&mut self, heading: &Heading) {
        self.entries.push(OutlineEntry {
            level: heading.level,
            text: heading.text.clone(),
            id: heading.meta.id.clone(),
        });
    }
}

#[derive(Default)]
struct IdCollector {
    ids: Vec<NodeId>,
}

impl IdCollector {
    fn record(&mut self, meta: &NodeMeta) {
        if let Some(id) = &meta.id {
            self.ids.push(id.clone());
        }
    }
}

impl Visitor for IdCollector {
    fn visit_heading(&mut self, heading: &Heading) {
        self.record(&heading.meta);
    }

    fn visit_paragraph(&mut self, paragraph: &Paragraph) {
        self.record(&paragraph.meta);
    }

    fn visit_code_block(&mut self, block: &CodeBlock) {
        self.record(&block.meta);
    }

    fn visit_list(&mut self, list: &List) {
        self.record(&list.meta);
        walk_list(self, list);
    }

    fn visit_list_item(&mut self, item: &ListItem) {
        self.record(&item.meta);
        walk_list_item(self, item);
    }

    fn visit_block_quote(&mut self, quote: &BlockQuote) {
        self.record(&quote.meta);
        walk_block_quote(self, quote);
    }

    fn visit_unknown(&mut self, node: &UnknownNode) {
        self.record(&node.meta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(vec![
            Node::heading(1, "Title"),
            Node::paragraph("Intro"),
            Node::heading(2, "Details"),
        ])
    }

    #[test]
    fn test_find_node_by_id() {
        let doc = sample();
        let id = doc.nodes()[1].id().unwrap().clone();

        let found = doc.find_node(&id).expect("paragraph should be indexed");
        assert_eq!(found.node_type(), "paragraph");
        assert!(doc.contains(&id));
    }

    #[test]
    fn test_nodes_without_id_are_not_indexed() {
        let mut heading = Heading::new(1, "Anonymous");
        heading.meta.id = None;
        let doc = Document::new(vec![Node::Heading(heading), Node::paragraph("Indexed")]);

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.index.len(), 1);
    }

    #[test]
    fn test_filter_rebuilds_index() {
        let doc = sample();
        let paragraph_id = doc.nodes()[1].id().unwrap().clone();

        let headings = doc.filter(Node::is_heading);
        assert_eq!(headings.len(), 2);
        assert!(headings.find_node(&paragraph_id).is_none());
        assert!(doc.find_node(&paragraph_id).is_some());
    }

    #[test]
    fn test_find_nodes_preserves_order() {
        let doc = sample();
        let found = doc.find_nodes(|node| node.is_heading());
        let texts: Vec<_> = found
            .iter()
            .filter_map(|n| n.as_heading().map(|h| h.text.as_str()))
            .collect();
        assert_eq!(texts, vec!["Title", "Details"]);
    }

    #[test]
    fn test_map_rebuilds_index() {
        let doc = sample();
        let original_id = doc.nodes()[1].id().unwrap().clone();

        let mapped = doc.map(|node| match node {
            Node::Paragraph(p) => Node::Paragraph(p.with_content("Rewritten", None)),
            other => other.clone(),
        });

        assert!(mapped.find_node(&original_id).is_none());
        let new_id = mapped.nodes()[1].id().unwrap();
        assert!(mapped.find_node(new_id).is_some());
    }

    #[test]
    fn test_union_concatenates_without_dedup() {
        let doc = sample();
        let other = Document::new(vec![Node::paragraph("Intro")]);
        let merged = doc.union(&other);

        assert_eq!(merged.len(), 4);
        assert_eq!(merged.nodes()[3].node_type(), "paragraph");
        assert_eq!(merged.nodes()[0].node_type(), "heading");
    }

    #[test]
    fn test_outline_includes_nested_headings() {
        let doc = Document::new(vec![
            Node::heading(1, "Top"),
            Node::block_quote(vec![Node::heading(3, "Quoted")]),
        ]);

        let outline = doc.outline();
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[1].level, 3);
        assert_eq!(outline[1].text, "Quoted");
    }

    #[test]
    fn test_all_ids_pre_order() {
        let doc = Document::new(vec![Node::list(
            false,
            vec![ListItem::new(vec![Node::paragraph("a")])],
        )]);

        let types: Vec<_> = doc.all_ids().iter().map(|id| id.node_type().to_string()).collect();
        assert_eq!(types, vec!["list", "listitem", "paragraph"]);
    }
}
