//! Persisted settings for formwork.
//!
//! Holds the list of authored forms with their active flag, loaded from and
//! saved to a JSON file, plus the built-in form used to author a field.

pub mod authoring;
mod error;
mod store;

pub use error::{Result, SettingsError};
pub use store::{form_id, FormRecord, SettingsStore};
