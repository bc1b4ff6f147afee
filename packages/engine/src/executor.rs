//! Runs parsed scripts against a document

use crate::error::{ExecError, ExecResult};
use crate::registry::build_operation;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};
use treekit_core::Document;
use treekit_dsl::{parse_strict, parse_with_errors, ParseError, Pipeline, Statement};

/// Result of running a whole script
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptOutput {
    /// Value of the last statement, if any ran
    pub value: Option<Document>,
    /// Statements skipped during parsing
    pub parse_errors: Vec<ParseError>,
}

/// Script executor. `doc` refers to the input document; `let` bindings
/// persist across calls.
pub struct Executor {
    document: Document,
    variables: HashMap<String, Document>,
}

impl Executor {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            variables: HashMap::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn variable(&self, name: &str) -> Option<&Document> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&String, &Document)> {
        self.variables.iter()
    }

    pub fn bind(&mut self, name: impl Into<String>, document: Document) {
        self.variables.insert(name.into(), document);
    }

    /// Lex, parse with recovery, then run every statement
    #[instrument(skip(self, source), fields(bytes = source.len()))]
    pub fn execute_source(&mut self, source: &str) -> ExecResult<ScriptOutput> {
        let (statements, parse_errors) = parse_with_errors(source)?;
        for err in &parse_errors {
            warn!(error = %err, "Skipped malformed statement");
        }

        let value = self.execute_statements(&statements)?;
        Ok(ScriptOutput {
            value,
            parse_errors,
        })
    }

    /// Like [`Executor::execute_source`], but the first malformed statement
    /// aborts the script before anything runs
    #[instrument(skip(self, source), fields(bytes = source.len()))]
    pub fn execute_strict(&mut self, source: &str) -> ExecResult<Option<Document>> {
        let statements = parse_strict(source)?;
        self.execute_statements(&statements)
    }

    #[instrument(skip(self, statements), fields(statements = statements.len()))]
    pub fn execute_statements(&mut self, statements: &[Statement]) -> ExecResult<Option<Document>> {
        let mut last = None;
        for statement in statements {
            last = Some(self.execute_statement(statement)?);
        }
        info!(nodes = last.as_ref().map(Document::len), "Script finished");
        Ok(last)
    }

    pub fn execute_statement(&mut self, statement: &Statement) -> ExecResult<Document> {
        match statement {
            Statement::Pipeline(pipeline) => self.run_pipeline(pipeline),
            Statement::Assignment(assignment) => {
                let result = self.run_pipeline(&assignment.pipeline)?;
                debug!(variable = %assignment.variable, nodes = result.len(), "Binding variable");
                self.variables
                    .insert(assignment.variable.clone(), result.clone());
                Ok(result)
            }
        }
    }

    /// Apply each stage to the source document, left to right
    pub fn run_pipeline(&self, pipeline: &Pipeline) -> ExecResult<Document> {
        let mut current = self.resolve_source(pipeline)?.clone();

        for call in &pipeline.operations {
            let operation = build_operation(call)?;
            let before = current.len();
            current = operation
                .apply(&current)
                .map_err(|source| ExecError::Unsupported {
                    source,
                    position: call.position,
                })?;
            debug!(
                operation = operation.name(),
                before,
                after = current.len(),
                "Applied operation"
            );
        }

        Ok(current)
    }

    fn resolve_source(&self, pipeline: &Pipeline) -> ExecResult<&Document> {
        if pipeline.source == "doc" {
            return Ok(&self.document);
        }
        self.variables
            .get(&pipeline.source)
            .ok_or_else(|| ExecError::UndefinedVariable {
                name: pipeline.source.clone(),
                position: pipeline.position,
            })
    }
}
