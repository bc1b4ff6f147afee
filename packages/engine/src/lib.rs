//! Named document operations and a pipeline executor for treekit scripts.
//!
//! ```
//! use treekit_core::{Document, Node};
//! use treekit_engine::Executor;
//!
//! let doc = Document::new(vec![Node::heading(3, "Usage"), Node::paragraph("text")]);
//! let output = Executor::new(doc)
//!     .execute_source("doc | select heading | promote")
//!     .unwrap();
//! assert_eq!(output.value.unwrap().len(), 1);
//! ```

pub mod error;
pub mod executor;
pub mod operation;
pub mod registry;

pub use error::{ExecError, ExecResult, OpResult, UnsupportedOperationError};
pub use executor::{Executor, ScriptOutput};
pub use operation::{
    compose, demote, heading, lift, lower, nest, paragraph, pipe, promote, select, select_type,
    unnest, where_, Conditions, Operation,
};
pub use registry::{build_operation, lookup, Category, OperationInfo, ParameterInfo, OPERATIONS};
