//! Core types, AST definitions, and utilities for formwork.
//!
//! This crate provides the foundational types used across all other formwork crates:
//! - AST node types for parsed expression bodies
//! - The dynamic `Value` produced by evaluation
//! - The form/field model
//! - Reference token types and resolved field scopes
//! - User-visible notices
//! - Error types

pub mod ast;
pub mod errors;
pub mod form;
pub mod notice;
pub mod tokens;
pub mod types;

pub use ast::*;
pub use errors::*;
pub use form::*;
pub use notice::*;
pub use tokens::*;
pub use types::*;
