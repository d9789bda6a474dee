//! Reference token types and the scope of already-resolved field values.

use crate::ast::Span;
use crate::form::Field;
use crate::types::Value;
use indexmap::IndexMap;

/// Opens the expression region of a templated string.
pub const EXPRESSION_START: &str = "{{";
/// Closes the expression region of a templated string.
pub const EXPRESSION_END: &str = "}}";
/// Prefix of a field reference, followed by the class name.
pub const FIELD_REFERENCE_PREFIX: &str = "$$.";
/// Delimits a document or folder reference on both sides.
pub const DOCUMENT_MARKER: &str = "%%";
/// Trailing character that marks a folder reference.
pub const FOLDER_SEPARATOR: char = '/';
/// Extension assumed for document references without one.
pub const MARKDOWN_EXTENSION: &str = "md";

/// A `$$.className` occurrence inside an expression body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReference {
    pub class_name: String,
    /// Span of the whole token, prefix included.
    pub span: Span,
    /// Whether the token sits between a pair of `%%` markers.
    pub in_path: bool,
}

/// A `%%path%%` occurrence inside an expression body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReference {
    /// Text between the markers, untrimmed.
    pub path: String,
    /// Span of the whole token, markers included.
    pub span: Span,
}

impl DocumentReference {
    /// Folder references end with a path separator.
    pub fn is_folder(&self) -> bool {
        self.path.ends_with(FOLDER_SEPARATOR)
    }
}

/// Values of fields that have already been evaluated, keyed by class name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFields {
    values: IndexMap<String, Value>,
}

impl ResolvedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the current values of the given fields.
    ///
    /// Fields without a value yet are left out, so references to them
    /// resolve as missing.
    pub fn from_fields(fields: &[Field]) -> Self {
        let mut resolved = Self::new();
        for field in fields {
            if let Some(value) = &field.content.value {
                resolved.insert(&field.class_name, value.clone());
            }
        }
        resolved
    }

    pub fn insert(&mut self, class_name: &str, value: Value) {
        self.values.insert(class_name.to_string(), value);
    }

    pub fn get(&self, class_name: &str) -> Option<&Value> {
        self.values.get(class_name)
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.values.contains_key(class_name)
    }

    pub fn remove(&mut self, class_name: &str) -> Option<Value> {
        self.values.shift_remove(class_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for ResolvedFields {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
