//! Parser for formwork templated strings.
//!
//! This crate provides:
//! - The delimiter splitter (`{{ … }}` with literal prefix/suffix)
//! - Scanners for `$$.className` and `%%path%%` reference tokens
//! - A tokenizer and grammar for expression bodies, built on `nom`
//!   for the lexical pieces.

mod grammar;
mod lexer;
mod template;

pub use grammar::{parse, MAX_NESTING_DEPTH};
pub use lexer::{tokenize, Punct, SpannedToken, Token};
pub use template::{scan_document_references, scan_field_references, split_template, Template};

use formwork_core::{ParseError, Program};

/// Parse an expression body into a program.
///
/// # Example
///
/// ```ignore
/// use formwork_parser::parse_expression;
///
/// let program = parse_expression("['a', 'b'].includes(kind) ? 'yes' : 'no'")?;
/// ```
pub fn parse_expression(source: &str) -> Result<Program, ParseError> {
    parse(source)
}
