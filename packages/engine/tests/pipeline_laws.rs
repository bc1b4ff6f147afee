//! Pipeline and composition behavior over whole documents

use serde_json::json;
use treekit_core::{Document, ListItem, Node};
use treekit_engine::{
    compose, demote, heading, promote, where_, Conditions, ExecError, Executor,
};

fn levels(doc: &Document) -> Vec<u8> {
    doc.iter()
        .filter_map(|node| node.as_heading())
        .map(|h| h.level())
        .collect()
}

#[test]
fn test_compose_scenario() {
    let doc = Document::new(vec![
        Node::heading(1, "Top"),
        Node::heading(3, "Alpha"),
        Node::heading(3, "Beta"),
    ]);
    let mut level_three = Conditions::new();
    level_three.insert("level".into(), json!(3));

    let result = compose(vec![promote(), where_(level_three), heading()])
        .apply(&doc)
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(levels(&result), vec![2, 2]);
}

#[test]
fn test_script_matches_composition() {
    let doc = Document::new(vec![
        Node::heading(1, "Top"),
        Node::heading(3, "Alpha"),
        Node::paragraph("Body"),
        Node::heading(3, "Beta"),
    ]);
    let mut level_three = Conditions::new();
    level_three.insert("level".into(), json!(3));

    let composed = compose(vec![promote(), where_(level_three), heading()])
        .apply(&doc)
        .unwrap();
    let scripted = Executor::new(doc)
        .execute_source("doc | heading | where level=3 | promote")
        .unwrap()
        .value
        .unwrap();

    assert_eq!(composed, scripted);
}

#[test]
fn test_level_boundaries() {
    let doc = Document::new(vec![Node::heading(1, "Top"), Node::heading(6, "Bottom")]);

    assert_eq!(levels(&promote().apply(&doc).unwrap()), vec![1, 5]);
    assert_eq!(levels(&demote().apply(&doc).unwrap()), vec![2, 6]);
}

#[test]
fn test_structural_edits_keep_identity() {
    let doc = Document::new(vec![
        Node::heading(2, "Kept"),
        Node::list(true, vec![ListItem::new(vec![Node::paragraph("item")])]),
    ]);

    let out = Executor::new(doc.clone())
        .execute_source("doc | promote | demote | demote")
        .unwrap()
        .value
        .unwrap();

    assert_eq!(out.all_ids(), doc.all_ids());
    assert_eq!(levels(&out), vec![3]);
}

#[test]
fn test_where_on_code_language() {
    let doc = Document::new(vec![
        Node::code_block("fn main() {}", Some("rust")),
        Node::code_block("print()", Some("python")),
        Node::paragraph("rust"),
        Node::code_block("plain", None),
    ]);

    let out = Executor::new(doc)
        .execute_source(r#"doc | select codeblock | where language="rust""#)
        .unwrap()
        .value
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out.nodes()[0].attribute("code"), Some(json!("fn main() {}")));
}

#[test]
fn test_select_with_keywords_only() {
    let doc = Document::new(vec![Node::heading(2, "A"), Node::paragraph("B")]);
    let out = Executor::new(doc)
        .execute_source("doc | select level=2")
        .unwrap()
        .value
        .unwrap();
    assert_eq!(out.len(), 1);
}

#[test]
fn test_trailing_comma_statement_is_skipped() {
    let doc = Document::new(vec![Node::heading(2, "A")]);
    let output = Executor::new(doc)
        .execute_source(r#"doc | select codeblock, language="rust""#)
        .unwrap();

    assert_eq!(output.value, None);
    assert_eq!(output.parse_errors.len(), 1);
}

#[test]
fn test_compose_from_script_is_rejected() {
    let err = Executor::new(Document::empty())
        .execute_source("doc | compose")
        .unwrap_err();
    assert!(matches!(err, ExecError::NotCallable { .. }));
}

#[test]
fn test_multi_statement_script() {
    let doc = Document::new(vec![
        Node::heading(1, "Guide"),
        Node::heading(2, "Install"),
        Node::heading(2, "Configure"),
        Node::paragraph("Read me"),
    ]);
    let script = r#"
        # promote second-level sections
        let sections = doc | where type=heading, level=2
        let promoted = sections | promote
        promoted
    "#;

    let mut executor = Executor::new(doc);
    let output = executor.execute_source(script).unwrap();

    assert!(output.parse_errors.is_empty());
    assert_eq!(levels(&output.value.unwrap()), vec![1, 1]);
    assert_eq!(executor.variable("sections").map(Document::len), Some(2));
}
