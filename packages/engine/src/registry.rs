//! Operation registry
//!
//! A static table describing every named operation, plus the binding from a
//! parsed [`FunctionCall`] to a runnable [`Operation`].

use crate::error::{ExecError, ExecResult};
use crate::operation::{self, Conditions, Operation};
use serde::Serialize;
use treekit_dsl::{FunctionCall, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Filter,
    Structure,
    Combinator,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// Introspection data for completion and hover
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OperationInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [ParameterInfo],
    pub category: Category,
    pub examples: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<&'static str>,
}

pub static OPERATIONS: &[OperationInfo] = &[
    OperationInfo {
        name: "select",
        description: "Keep nodes of a given type, optionally matching attributes",
        parameters: &[
            ParameterInfo {
                name: "type",
                description: "Node type given positionally, e.g. `select heading`",
                required: false,
            },
            ParameterInfo {
                name: "**conditions",
                description: "Attribute equality conditions",
                required: false,
            },
        ],
        category: Category::Filter,
        examples: &["doc | select heading", "doc | select level=2"],
        alias_of: None,
    },
    OperationInfo {
        name: "where",
        description: "Keep nodes whose attributes all equal the given values",
        parameters: &[ParameterInfo {
            name: "**conditions",
            description: "Attribute equality conditions",
            required: false,
        }],
        category: Category::Filter,
        examples: &[
            "doc | where level=2",
            "doc | where type=heading, text=\"Introduction\"",
        ],
        alias_of: None,
    },
    OperationInfo {
        name: "promote",
        description: "Raise heading levels by one, stopping at 1",
        parameters: &[],
        category: Category::Structure,
        examples: &["doc | select heading | promote"],
        alias_of: None,
    },
    OperationInfo {
        name: "demote",
        description: "Lower heading levels by one, stopping at 6",
        parameters: &[],
        category: Category::Structure,
        examples: &["doc | select heading | demote"],
        alias_of: None,
    },
    OperationInfo {
        name: "lift",
        description: "Raise heading levels by one, stopping at 1",
        parameters: &[],
        category: Category::Structure,
        examples: &["doc | lift"],
        alias_of: Some("promote"),
    },
    OperationInfo {
        name: "lower",
        description: "Lower heading levels by one, stopping at 6",
        parameters: &[],
        category: Category::Structure,
        examples: &["doc | lower"],
        alias_of: Some("demote"),
    },
    OperationInfo {
        name: "nest",
        description: "Lower heading levels by one; reparenting under a target is not implemented",
        parameters: &[ParameterInfo {
            name: "under",
            description: "Target to nest under (unsupported)",
            required: false,
        }],
        category: Category::Structure,
        examples: &["doc | nest"],
        alias_of: None,
    },
    OperationInfo {
        name: "unnest",
        description: "Raise heading levels by one, stopping at 1",
        parameters: &[],
        category: Category::Structure,
        examples: &["doc | unnest"],
        alias_of: Some("promote"),
    },
    OperationInfo {
        name: "heading",
        description: "Keep only headings",
        parameters: &[],
        category: Category::Filter,
        examples: &["doc | heading"],
        alias_of: None,
    },
    OperationInfo {
        name: "paragraph",
        description: "Keep only paragraphs",
        parameters: &[],
        category: Category::Filter,
        examples: &["doc | paragraph"],
        alias_of: None,
    },
    OperationInfo {
        name: "compose",
        description: "Combine operations right to left: compose(f, g)(x) = f(g(x))",
        parameters: &[ParameterInfo {
            name: "*operations",
            description: "Operations to combine",
            required: true,
        }],
        category: Category::Combinator,
        examples: &["compose(promote, heading)"],
        alias_of: None,
    },
];

pub fn lookup(name: &str) -> Option<&'static OperationInfo> {
    OPERATIONS.iter().find(|info| info.name == name)
}

pub fn operation_names() -> impl Iterator<Item = &'static str> {
    OPERATIONS.iter().map(|info| info.name)
}

/// Turn a parsed call into an operation, checking its arguments
pub fn build_operation(call: &FunctionCall) -> ExecResult<Operation> {
    let name = call.name.as_str();
    if lookup(name).is_none() {
        return Err(ExecError::UnknownOperation {
            name: call.name.clone(),
            position: call.position,
        });
    }

    match name {
        "select" => bind_select(call),
        "where" => Ok(operation::where_(conditions(call.arguments.iter()))),
        "promote" => no_arguments(call).map(|_| operation::promote()),
        "demote" => no_arguments(call).map(|_| operation::demote()),
        "lift" => no_arguments(call).map(|_| operation::lift()),
        "lower" => no_arguments(call).map(|_| operation::lower()),
        "unnest" => no_arguments(call).map(|_| operation::unnest()),
        "heading" => no_arguments(call).map(|_| operation::heading()),
        "paragraph" => no_arguments(call).map(|_| operation::paragraph()),
        "nest" => bind_nest(call),
        "compose" => Err(ExecError::NotCallable {
            name: call.name.clone(),
            position: call.position,
        }),
        _ => Err(ExecError::UnknownOperation {
            name: call.name.clone(),
            position: call.position,
        }),
    }
}

fn conditions<'a>(arguments: impl Iterator<Item = (&'a String, &'a Value)>) -> Conditions {
    arguments
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect()
}

fn no_arguments(call: &FunctionCall) -> ExecResult<()> {
    if call.arguments.is_empty() {
        Ok(())
    } else {
        Err(ExecError::invalid_argument(
            &call.name,
            "takes no arguments",
            call.position,
        ))
    }
}

fn bind_select(call: &FunctionCall) -> ExecResult<Operation> {
    let node_type = match call.positional.as_slice() {
        [] => None,
        [value] => match value.as_str() {
            Some(node_type) => Some(node_type.to_string()),
            None => {
                return Err(ExecError::invalid_argument(
                    &call.name,
                    format!("expected a node type, found {}", value),
                    call.position,
                ))
            }
        },
        _ => {
            return Err(ExecError::invalid_argument(
                &call.name,
                "expected at most one node type",
                call.position,
            ))
        }
    };

    let conditions = conditions(call.keyword_arguments());

    match (node_type, conditions.is_empty()) {
        (None, true) => Err(ExecError::invalid_argument(
            &call.name,
            "expected a node type or conditions",
            call.position,
        )),
        (Some(node_type), true) => Ok(operation::select_type(node_type)),
        (None, false) => Ok(operation::where_(conditions).named("select")),
        // Only hand-built calls carry both; the grammar allows one argument form
        (Some(node_type), false) => Ok(operation::select(move |node| {
            node.node_type() == node_type && operation::matches_conditions(node, &conditions)
        })),
    }
}

fn bind_nest(call: &FunctionCall) -> ExecResult<Operation> {
    if let Some(key) = call.arguments.keys().find(|key| key.as_str() != "under") {
        return Err(ExecError::invalid_argument(
            &call.name,
            format!("unknown argument '{}'", key),
            call.position,
        ));
    }
    let under = call.argument("under").map(Value::key);
    Ok(operation::nest(under))
}
