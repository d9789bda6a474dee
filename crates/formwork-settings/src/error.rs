//! Error types for formwork-settings.

use formwork_core::{ResolveError, UnknownFieldKind};
use thiserror::Error;

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors from loading, saving or mutating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON for the expected shape.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// No form with this id.
    #[error("form not found: {0}")]
    FormNotFound(String),

    /// The form's field references do not validate.
    #[error("invalid form {title}: {}", join(.errors))]
    InvalidForm {
        title: String,
        errors: Vec<ResolveError>,
    },

    /// An authored field is incomplete.
    #[error("invalid field: {0}")]
    InvalidField(String),

    #[error(transparent)]
    UnknownFieldKind(#[from] UnknownFieldKind),
}

fn join(errors: &[ResolveError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
