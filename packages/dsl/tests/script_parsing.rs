//! End-to-end lexing and parsing of realistic scripts

use treekit_dsl::{
    parse, parse_with_errors, tokenize, ParseError, Position, Statement, TokenKind, Value,
};

#[test]
fn test_token_stream_for_filter_pipeline() {
    let kinds: Vec<TokenKind> = tokenize("doc | select heading | where level=3")
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect();

    assert_eq!(
        kinds,
        vec![
            TokenKind::Doc,
            TokenKind::Pipe,
            TokenKind::Select,
            TokenKind::Identifier,
            TokenKind::Pipe,
            TokenKind::Where,
            TokenKind::Identifier,
            TokenKind::Equals,
            TokenKind::Number,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_filter_pipeline_structure() {
    let statements = parse("doc | select heading | where level=2").unwrap();
    assert_eq!(statements.len(), 1);

    let pipeline = match &statements[0] {
        Statement::Pipeline(p) => p,
        other => panic!("expected pipeline, got {:?}", other),
    };

    assert_eq!(pipeline.source, "doc");
    let names: Vec<&str> = pipeline.operations.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["select", "where"]);
    assert_eq!(
        pipeline.operations[1].arguments.get("level"),
        Some(&Value::Integer(2))
    );
}

#[test]
fn test_script_with_comments_and_variables() {
    let source = r#"
# collect top-level headings
let top = doc | select heading | where level=1

top | demote   # push them down
let quotes = doc | select blockquote
quotes
"#;

    let statements = parse(source).unwrap();
    assert_eq!(statements.len(), 4);
    assert!(matches!(statements[0], Statement::Assignment(_)));
    assert_eq!(statements[0].position(), Position { line: 3, column: 1 });
    assert_eq!(statements[1].pipeline().source, "top");
    assert_eq!(statements[3].pipeline().source, "quotes");
    assert!(statements[3].pipeline().operations.is_empty());
}

#[test]
fn test_each_bad_line_is_dropped_independently() {
    let source = "doc | where level=\ndoc | select heading\nlet = doc\ndoc | promote";
    let (statements, errors) = parse_with_errors(source).unwrap();

    assert_eq!(statements.len(), 2);
    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], ParseError::MissingValue { .. }));
    assert_eq!(errors[0].position(), Position { line: 1, column: 19 });
    assert!(matches!(errors[1], ParseError::UnexpectedToken { .. }));
    assert_eq!(errors[1].position(), Position { line: 3, column: 5 });
}

#[test]
fn test_statement_display_is_reparsable() {
    let source = r#"let x = doc | where text="a b", level=2 | promote"#;
    let first = parse(source).unwrap();
    let second = parse(&first[0].to_string()).unwrap();

    assert_eq!(first[0].to_string(), second[0].to_string());
}
