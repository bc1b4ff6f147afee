//! JSON wire format for documents
//!
//! ```text
//! { "version": "1.0", "nodes": [ { "type": "heading", "level": 1, "text": "..." }, ... ] }
//! ```
//!
//! Every node carries a `type` discriminator; children are encoded
//! recursively. `id`, `provenance`, `source_span` and `metadata` are optional.
//! A stored id is kept on decode if it is a full digest for the same node
//! type; a missing one is recomputed.

use crate::document::Document;
use crate::error::{SerializationError, SerializationResult};
use crate::identity::NodeId;
use crate::node::*;
use crate::provenance::Provenance;
use crate::span::SourceSpan;
use serde_json::{json, Map, Value};
use tracing::warn;

pub const FORMAT_VERSION: &str = "1.0";

pub fn to_json(doc: &Document) -> SerializationResult<String> {
    let value = to_json_value(doc)?;
    serde_json::to_string(&value).map_err(|e| SerializationError::Encode(e.to_string()))
}

pub fn to_json_pretty(doc: &Document) -> SerializationResult<String> {
    let value = to_json_value(doc)?;
    serde_json::to_string_pretty(&value).map_err(|e| SerializationError::Encode(e.to_string()))
}

pub fn to_json_value(doc: &Document) -> SerializationResult<Value> {
    let nodes = doc
        .iter()
        .map(encode_node)
        .collect::<SerializationResult<Vec<_>>>()?;

    Ok(json!({
        "version": FORMAT_VERSION,
        "nodes": nodes,
    }))
}

pub fn from_json(input: &str) -> SerializationResult<Document> {
    let value: Value = serde_json::from_str(input)?;
    from_json_value(&value)
}

pub fn from_json_value(value: &Value) -> SerializationResult<Document> {
    let root = value.as_object().ok_or(SerializationError::NotAnObject)?;

    match root.get("version").and_then(Value::as_str) {
        Some(FORMAT_VERSION) | None => {}
        Some(other) => warn!(version = other, "Unexpected document format version"),
    }

    let nodes = root
        .get("nodes")
        .ok_or(SerializationError::MissingNodes)?
        .as_array()
        .ok_or(SerializationError::NodesNotArray)?;

    let nodes = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| decode_node(node, &format!("nodes[{}]", i)))
        .collect::<SerializationResult<Vec<_>>>()?;

    Ok(Document::new(nodes))
}

// Encoding

fn encode_node(node: &Node) -> SerializationResult<Value> {
    let mut object = Map::new();
    object.insert("type".to_string(), Value::from(node.node_type()));

    match node {
        Node::Heading(heading) => {
            object.insert("level".to_string(), Value::from(heading.level));
            object.insert("text".to_string(), Value::from(heading.text.as_str()));
        }
        Node::Paragraph(paragraph) => {
            object.insert("content".to_string(), Value::from(paragraph.content.as_str()));
        }
        Node::List(list) => {
            let items = list
                .items
                .iter()
                .map(|item| encode_node(&Node::ListItem(item.clone())))
                .collect::<SerializationResult<Vec<_>>>()?;
            object.insert("ordered".to_string(), Value::from(list.ordered));
            object.insert("items".to_string(), Value::Array(items));
        }
        Node::ListItem(item) => {
            object.insert("content".to_string(), encode_children(&item.content)?);
        }
        Node::CodeBlock(block) => {
            object.insert(
                "language".to_string(),
                block.language.as_deref().map(Value::from).unwrap_or(Value::Null),
            );
            object.insert("code".to_string(), Value::from(block.code.as_str()));
        }
        Node::BlockQuote(quote) => {
            object.insert("content".to_string(), encode_children(&quote.content)?);
        }
        Node::Unknown(unknown) => {
            object.insert("text".to_string(), Value::from(unknown.text.as_str()));
        }
    }

    encode_meta(node.meta(), &mut object)?;
    Ok(Value::Object(object))
}

fn encode_children(children: &[Node]) -> SerializationResult<Value> {
    let encoded = children
        .iter()
        .map(encode_node)
        .collect::<SerializationResult<Vec<_>>>()?;
    Ok(Value::Array(encoded))
}

fn encode_meta(meta: &NodeMeta, object: &mut Map<String, Value>) -> SerializationResult<()> {
    let encode = |e: serde_json::Error| SerializationError::Encode(e.to_string());

    if let Some(id) = &meta.id {
        object.insert("id".to_string(), serde_json::to_value(id).map_err(encode)?);
    }
    if let Some(provenance) = &meta.provenance {
        object.insert(
            "provenance".to_string(),
            serde_json::to_value(provenance).map_err(encode)?,
        );
    }
    if let Some(span) = &meta.source_span {
        object.insert(
            "source_span".to_string(),
            serde_json::to_value(span).map_err(encode)?,
        );
    }
    if !meta.metadata.is_empty() {
        let metadata: Map<String, Value> = meta
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        object.insert("metadata".to_string(), Value::Object(metadata));
    }
    Ok(())
}

// Decoding

fn decode_node(value: &Value, path: &str) -> SerializationResult<Node> {
    let object = value.as_object().ok_or_else(|| SerializationError::InvalidNode {
        path: path.to_string(),
    })?;

    let node_type = object
        .get("type")
        .ok_or_else(|| SerializationError::MissingType {
            path: path.to_string(),
        })?
        .as_str()
        .ok_or_else(|| {
            SerializationError::invalid_field("node", "type", path, "expected a string")
        })?;

    let fields = Fields {
        object,
        node_type,
        path,
    };

    let node = match node_type {
        "heading" => {
            let level = fields.u64("level")?;
            let text = fields.string("text")?;
            let heading = Heading::try_new(level, text).map_err(|e| {
                SerializationError::invalid_field(node_type, "level", path, e.to_string())
            })?;
            Node::Heading(heading)
        }
        "paragraph" => Node::paragraph(fields.string("content")?),
        "list" => {
            let ordered = fields.optional_bool("ordered")?.unwrap_or(false);
            let items = fields
                .array("items")?
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let item_path = format!("{}.items[{}]", path, i);
                    match decode_node(item, &item_path)? {
                        Node::ListItem(item) => Ok(item),
                        other => Err(SerializationError::invalid_field(
                            node_type,
                            "items",
                            &item_path,
                            format!("expected listitem, found {}", other.node_type()),
                        )),
                    }
                })
                .collect::<SerializationResult<Vec<_>>>()?;
            Node::list(ordered, items)
        }
        "listitem" => Node::list_item(fields.children("content")?),
        "codeblock" => {
            let code = fields.string("code")?;
            let language = fields.optional_string("language")?;
            Node::CodeBlock(CodeBlock::new(code, language))
        }
        "blockquote" => Node::block_quote(fields.children("content")?),
        other => {
            return Err(SerializationError::UnknownType {
                node_type: other.to_string(),
                path: path.to_string(),
            })
        }
    };

    fields.apply_meta(node)
}

/// Typed field access on one node object, with errors naming the field
struct Fields<'a> {
    object: &'a Map<String, Value>,
    node_type: &'a str,
    path: &'a str,
}

impl<'a> Fields<'a> {
    fn invalid(&self, field: &str, message: impl Into<String>) -> SerializationError {
        SerializationError::invalid_field(self.node_type, field, self.path, message)
    }

    fn required(&self, field: &str) -> SerializationResult<&'a Value> {
        self.object
            .get(field)
            .ok_or_else(|| self.invalid(field, "missing"))
    }

    fn string(&self, field: &str) -> SerializationResult<String> {
        self.required(field)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(field, "expected a string"))
    }

    fn u64(&self, field: &str) -> SerializationResult<u64> {
        self.required(field)?
            .as_u64()
            .ok_or_else(|| self.invalid(field, "expected a non-negative integer"))
    }

    fn array(&self, field: &str) -> SerializationResult<&'a Vec<Value>> {
        self.required(field)?
            .as_array()
            .ok_or_else(|| self.invalid(field, "expected an array"))
    }

    fn optional_string(&self, field: &str) -> SerializationResult<Option<String>> {
        match self.object.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(field, "expected a string or null")),
        }
    }

    fn optional_bool(&self, field: &str) -> SerializationResult<Option<bool>> {
        match self.object.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.invalid(field, "expected a boolean")),
        }
    }

    fn children(&self, field: &str) -> SerializationResult<Vec<Node>> {
        self.array(field)?
            .iter()
            .enumerate()
            .map(|(i, child)| decode_node(child, &format!("{}.{}[{}]", self.path, field, i)))
            .collect()
    }

    fn optional_typed<T: serde::de::DeserializeOwned>(
        &self,
        field: &str,
    ) -> SerializationResult<Option<T>> {
        match self.object.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| self.invalid(field, e.to_string())),
        }
    }

    fn check_id(&self, id: &NodeId, node: &Node) -> SerializationResult<()> {
        if !id.has_full_hash() {
            return Err(self.invalid("id", "content_hash must be 64 lowercase hex characters"));
        }
        if id.node_type() != node.node_type() {
            return Err(self.invalid(
                "id",
                format!("node_type '{}' does not match '{}'", id.node_type(), node.node_type()),
            ));
        }
        Ok(())
    }

    fn apply_meta(&self, node: Node) -> SerializationResult<Node> {
        let id: Option<NodeId> = self.optional_typed("id")?;
        if let Some(id) = &id {
            self.check_id(id, &node)?;
        }
        let provenance: Option<Provenance> = self.optional_typed("provenance")?;
        let span: Option<SourceSpan> = self.optional_typed("source_span")?;

        let mut node = node.attach_identity(id, provenance, span);

        match self.object.get("metadata") {
            None | Some(Value::Null) => {}
            Some(Value::Object(entries)) => {
                for (key, value) in entries {
                    node = node.with_metadata(key.clone(), value.clone());
                }
            }
            Some(_) => return Err(self.invalid("metadata", "expected an object")),
        }

        Ok(node)
    }
}
