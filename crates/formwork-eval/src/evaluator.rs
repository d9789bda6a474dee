//! The expression evaluator: splits a templated string, resolves its
//! references, runs the body and reassembles the result.

use formwork_core::{FormworkError, Notice, NoticeSink, ResolvedFields, Value};
use formwork_parser::{parse, split_template};
use formwork_resolver::{resolve_document_references, resolve_field_references};
use formwork_store::DocumentStore;

use crate::interpreter::{Interpreter, DEFAULT_STEP_LIMIT};

/// Evaluates templated strings against a document store.
///
/// Holds no state between calls apart from what the store holds, so
/// evaluating the same input twice gives the same result.
#[derive(Clone, Copy)]
pub struct ExpressionEvaluator<'a> {
    store: &'a dyn DocumentStore,
    notices: &'a dyn NoticeSink,
    step_limit: usize,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(store: &'a dyn DocumentStore, notices: &'a dyn NoticeSink) -> Self {
        Self {
            store,
            notices,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn notices(&self) -> &'a dyn NoticeSink {
        self.notices
    }

    /// Evaluate a templated string.
    ///
    /// Without an expression the literal text comes back unchanged. With
    /// literal text around the expression the result is a string; a bare
    /// expression keeps its type. Failures never propagate: they raise an
    /// evaluation notice and yield the literal text alone.
    pub async fn evaluate(&self, templated: &str, fields: &ResolvedFields) -> Value {
        if templated.is_empty() {
            return Value::empty_string();
        }

        let template = split_template(templated);
        if !template.has_expression() {
            return Value::string(template.prefix);
        }

        let body = resolve_field_references(template.body, fields);
        let body = resolve_document_references(&body, self.store, self.notices).await;

        match self.execute(&body) {
            Ok(value) if template.has_literal() => Value::String(format!(
                "{}{}{}",
                template.prefix,
                value.to_display_string(),
                template.suffix
            )),
            Ok(value) => value,
            Err(error) => {
                tracing::error!(
                    expression = templated,
                    resolved = %body,
                    error = %error,
                    "expression evaluation failed"
                );
                self.notices.notify(Notice::EvaluationFailed {
                    expression: templated.to_string(),
                    reason: error.to_string(),
                });
                Value::String(format!("{}{}", template.prefix, template.suffix))
            }
        }
    }

    /// Parse and run a fully resolved body.
    pub fn execute(&self, body: &str) -> Result<Value, FormworkError> {
        let program = parse(body)?;
        let value = Interpreter::with_step_limit(self.step_limit).run(&program)?;
        Ok(value)
    }
}
