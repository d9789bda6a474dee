//! Reference resolution for formwork.
//!
//! Resolves the two kinds of reference tokens inside an expression body:
//! - `$$.className` field references, against already-evaluated siblings
//! - `%%path%%` document and folder references, against a document store
//!
//! Also offers static validation of the reference graph of a form.

mod documents;
mod fields;
mod graph;

pub use documents::resolve_document_references;
pub use fields::{quote_literal, resolve_field_references};
pub use graph::{field_references, validate_form};
