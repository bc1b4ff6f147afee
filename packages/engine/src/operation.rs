//! Document operations
//!
//! An [`Operation`] is a named, cloneable `Document -> Document` function.
//! Pipelines apply operations left to right; [`compose`] applies them right
//! to left like function composition.

use crate::error::{OpResult, UnsupportedOperationError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use treekit_core::{Document, Heading, Node};

type OperationFn = dyn Fn(&Document) -> OpResult<Document>;

/// Attribute name to required value
pub type Conditions = BTreeMap<String, Value>;

#[derive(Clone)]
pub struct Operation {
    name: String,
    apply: Rc<OperationFn>,
}

impl Operation {
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&Document) -> OpResult<Document> + 'static,
    {
        Self {
            name: name.into(),
            apply: Rc::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same behavior under another name
    pub fn named(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            apply: self.apply,
        }
    }

    pub fn apply(&self, document: &Document) -> OpResult<Document> {
        (self.apply)(document)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation").field("name", &self.name).finish()
    }
}

/// Keep nodes satisfying `predicate`, order preserved
pub fn select<P>(predicate: P) -> Operation
where
    P: Fn(&Node) -> bool + 'static,
{
    Operation::new("select", move |doc| Ok(doc.find_nodes(&predicate)))
}

/// Keep nodes whose type tag equals `node_type`
pub fn select_type(node_type: impl Into<String>) -> Operation {
    let node_type = node_type.into();
    select(move |node| node.node_type() == node_type)
}

/// Conjunctive exact-equality filter. A missing attribute fails the match.
pub fn where_(conditions: Conditions) -> Operation {
    Operation::new("where", move |doc| {
        Ok(doc.find_nodes(|node| matches_conditions(node, &conditions)))
    })
}

pub fn matches_conditions(node: &Node, conditions: &Conditions) -> bool {
    conditions.iter().all(|(name, expected)| {
        node.attribute(name)
            .map_or(false, |actual| values_equal(&actual, expected))
    })
}

/// Equality with integers and floats compared by numeric value
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

fn map_headings<F>(name: &str, transform: F) -> Operation
where
    F: Fn(&Heading) -> Heading + 'static,
{
    Operation::new(name, move |doc| {
        Ok(doc.map(|node| match node {
            Node::Heading(heading) => Node::Heading(transform(heading)),
            other => other.clone(),
        }))
    })
}

/// Raise headings one level, never above 1. Ids are kept.
pub fn promote() -> Operation {
    map_headings("promote", Heading::promoted)
}

/// Lower headings one level, never below 6. Ids are kept.
pub fn demote() -> Operation {
    map_headings("demote", Heading::demoted)
}

pub fn lift() -> Operation {
    promote().named("lift")
}

pub fn lower() -> Operation {
    demote().named("lower")
}

pub fn unnest() -> Operation {
    promote().named("unnest")
}

/// Demote, or reparent under a target when `under` is given.
///
/// Reparenting is not implemented; asking for it fails when applied.
pub fn nest(under: Option<String>) -> Operation {
    match under {
        None => demote().named("nest"),
        Some(target) => Operation::new("nest", move |_| {
            Err(UnsupportedOperationError::new(
                "nest",
                format!("reparenting under '{}'", target),
            ))
        }),
    }
}

pub fn heading() -> Operation {
    select_type("heading").named("heading")
}

pub fn paragraph() -> Operation {
    select_type("paragraph").named("paragraph")
}

/// `compose([f, g, h])` applies `h`, then `g`, then `f`
pub fn compose(operations: Vec<Operation>) -> Operation {
    let name = format!(
        "compose({})",
        operations
            .iter()
            .map(Operation::name)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Operation::new(name, move |doc| {
        operations
            .iter()
            .rev()
            .try_fold(doc.clone(), |acc, op| op.apply(&acc))
    })
}

/// `pipe([f, g, h])` applies `f`, then `g`, then `h`
pub fn pipe(operations: Vec<Operation>) -> Operation {
    let name = operations
        .iter()
        .map(Operation::name)
        .collect::<Vec<_>>()
        .join(" | ");
    Operation::new(name, move |doc| {
        operations
            .iter()
            .try_fold(doc.clone(), |acc, op| op.apply(&acc))
    })
}
