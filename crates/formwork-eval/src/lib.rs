//! Evaluation for formwork templated strings.
//!
//! This crate provides:
//! - A restricted interpreter for parsed expression bodies
//! - The [`ExpressionEvaluator`], which ties splitting, reference
//!   resolution and execution together with failure fallback
//! - [`FormRenderer`] and [`FormSession`] for evaluating whole forms
//!
//! # Example
//!
//! ```ignore
//! use formwork_core::{LogNotices, ResolvedFields};
//! use formwork_eval::ExpressionEvaluator;
//! use formwork_store::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let evaluator = ExpressionEvaluator::new(&store, &LogNotices);
//! let value = futures::executor::block_on(
//!     evaluator.evaluate("prefix-{{1+1}}-suffix", &ResolvedFields::new()),
//! );
//! assert_eq!(value.to_string(), "prefix-2-suffix");
//! ```

mod evaluator;
mod form;
mod interpreter;
mod methods;

pub use evaluator::ExpressionEvaluator;
pub use form::{FormRenderer, FormSession, RenderedField, RenderedForm};
pub use interpreter::{
    execute, Arg, Function, Interpreter, DEFAULT_STEP_LIMIT, MAX_STRING_LENGTH,
};
