//! Round-trip tests for the JSON wire format

use serde_json::json;
use treekit_core::{
    Document, ListItem, Node, Provenance, SerializationError, SourceSpan,
};

fn nested_document() -> Document {
    Document::new(vec![
        Node::heading(1, "Guide"),
        Node::paragraph("Welcome to the guide."),
        Node::list(
            true,
            vec![
                ListItem::new(vec![Node::paragraph("Install")]),
                ListItem::new(vec![
                    Node::paragraph("Configure"),
                    Node::heading(4, "Nested heading"),
                ]),
            ],
        ),
        Node::code_block("cargo build\n", Some("sh")),
        Node::block_quote(vec![Node::heading(2, "Quoted"), Node::paragraph("body")]),
        Node::list_item(vec![Node::paragraph("loose item")]),
    ])
}

#[test]
fn test_roundtrip_preserves_length_and_types() {
    let doc = nested_document();
    let json = doc.to_json().expect("Failed to encode");
    let back = Document::from_json(&json).expect("Failed to decode");

    assert_eq!(back.len(), doc.len());
    for (a, b) in doc.iter().zip(back.iter()) {
        assert_eq!(a.node_type(), b.node_type());
    }
}

#[test]
fn test_roundtrip_preserves_nested_structure_and_ids() {
    let doc = nested_document();
    let back = Document::from_json(&doc.to_json_pretty().unwrap()).unwrap();

    assert_eq!(back, doc);
    assert_eq!(back.all_ids(), doc.all_ids());
}

#[test]
fn test_roundtrip_carries_meta() {
    let provenance = Provenance::now().with_author("alice");
    let doc = Document::new(vec![Node::paragraph("tracked")
        .with_provenance(provenance.clone())
        .with_source_span(SourceSpan::new(0, 0, 2, 5))
        .with_metadata("tags", json!(["a", "b"]))]);

    let back = Document::from_json(&doc.to_json().unwrap()).unwrap();
    let node = &back.nodes()[0];

    assert_eq!(node.provenance(), Some(&provenance));
    assert_eq!(node.source_span(), Some(&SourceSpan::new(0, 0, 2, 5)));
    assert_eq!(node.metadata()["tags"], json!(["a", "b"]));
}

#[test]
fn test_list_items_must_be_list_items() {
    let input = r#"{"version": "1.0", "nodes": [
        {"type": "list", "ordered": false, "items": [{"type": "paragraph", "content": "x"}]}
    ]}"#;

    match Document::from_json(input).unwrap_err() {
        SerializationError::InvalidField { field, path, .. } => {
            assert_eq!(field, "items");
            assert_eq!(path, "nodes[0].items[0]");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_empty_document_roundtrip() {
    let doc = Document::empty();
    let json = doc.to_json().unwrap();
    assert_eq!(json, r#"{"nodes":[],"version":"1.0"}"#);
    assert!(Document::from_json(&json).unwrap().is_empty());
}
