//! Error types for formwork.

use thiserror::Error;

/// Top-level error type for formwork.
#[derive(Debug, Error)]
pub enum FormworkError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors while parsing an expression body.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected token at column {column}: expected {expected}, found {found:?}")]
    UnexpectedToken {
        found: String,
        expected: String,
        column: usize,
    },

    #[error("Unexpected character {found:?} at column {column}")]
    UnexpectedChar { found: char, column: usize },

    #[error("Unterminated string starting at column {column}")]
    UnterminatedString { column: usize },

    #[error("Invalid escape sequence at column {column}")]
    InvalidEscape { column: usize },

    #[error("Invalid number format: {value}")]
    InvalidNumber { value: String, column: usize },

    #[error("Arrow function parameters must be identifiers")]
    InvalidArrowParams { column: usize },

    #[error("Expression nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("Empty expression")]
    Empty,

    #[error("Unexpected end of input")]
    UnexpectedEof,
}

/// Errors while executing a parsed expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{name} is not defined")]
    UndefinedVariable { name: String },

    #[error("Cannot read properties of {target} (reading '{property}')")]
    PropertyOfNothing { target: String, property: String },

    #[error("{type_name}.{method} is not a supported function")]
    UnknownMethod { type_name: String, method: String },

    #[error("{callee} is not a function")]
    NotCallable { callee: String },

    #[error("Invalid argument for {function}: {reason}")]
    InvalidArgument { function: String, reason: String },

    #[error("Arrow functions can only be passed as call arguments")]
    UnexpectedArrow,

    #[error("Evaluation exceeded {limit} steps")]
    StepLimit { limit: usize },

    #[error("Invalid string length: longer than {limit} bytes")]
    StringTooLong { limit: usize },
}

/// Errors found while validating references between fields of a form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Duplicate class name: {class_name}")]
    DuplicateClassName { class_name: String },

    #[error("Field {field} references unknown field {reference}")]
    UnknownField { field: String, reference: String },

    #[error("Field {field} references itself")]
    SelfReference { field: String },

    #[error("Field {field} references {reference}, which is defined later in the form")]
    ForwardReference { field: String, reference: String },

    #[error("Circular field reference: {}", .cycle.join(" -> "))]
    CircularReference { cycle: Vec<String> },
}

/// Errors from the external document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File not found at {path}")]
    DocumentNotFound { path: String },

    #[error("Folder not found at {path}")]
    FolderNotFound { path: String },

    #[error("Can't handle .{extension} extension, .md expected")]
    UnsupportedFormat { path: String, extension: String },

    #[error("Invalid structured data in {path}: {reason}")]
    InvalidData { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the error means the target simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::DocumentNotFound { .. } | StoreError::FolderNotFound { .. }
        )
    }
}

/// Returned when parsing an unknown element-kind tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown field type: {0}")]
pub struct UnknownFieldKind(pub String);
