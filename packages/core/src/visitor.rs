use crate::node::*;

/// Visitor pattern for traversing document nodes immutably
///
/// Default implementations walk the whole tree depth-first. Override the
/// `visit_*` methods you care about and call the matching `walk_*` function
/// to keep descending.
pub trait Visitor: Sized {
    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_heading(&mut self, _heading: &Heading) {
        // Leaf node, no children to walk
    }

    fn visit_paragraph(&mut self, _paragraph: &Paragraph) {
        // Leaf node, no children to walk
    }

    fn visit_code_block(&mut self, _block: &CodeBlock) {
        // Leaf node, no children to walk
    }

    fn visit_list(&mut self, list: &List) {
        walk_list(self, list);
    }

    fn visit_list_item(&mut self, item: &ListItem) {
        walk_list_item(self, item);
    }

    fn visit_block_quote(&mut self, quote: &BlockQuote) {
        walk_block_quote(self, quote);
    }

    fn visit_unknown(&mut self, _node: &UnknownNode) {
        // Opaque, no children to walk
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    match node {
        Node::Heading(heading) => visitor.visit_heading(heading),
        Node::Paragraph(paragraph) => visitor.visit_paragraph(paragraph),
        Node::CodeBlock(block) => visitor.visit_code_block(block),
        Node::List(list) => visitor.visit_list(list),
        Node::ListItem(item) => visitor.visit_list_item(item),
        Node::BlockQuote(quote) => visitor.visit_block_quote(quote),
        Node::Unknown(unknown) => visitor.visit_unknown(unknown),
    }
}

pub fn walk_list<V: Visitor>(visitor: &mut V, list: &List) {
    for item in &list.items {
        visitor.visit_list_item(item);
    }
}

pub fn walk_list_item<V: Visitor>(visitor: &mut V, item: &ListItem) {
    for child in &item.content {
        visitor.visit_node(child);
    }
}

pub fn walk_block_quote<V: Visitor>(visitor: &mut V, quote: &BlockQuote) {
    for child in &quote.content {
        visitor.visit_node(child);
    }
}
