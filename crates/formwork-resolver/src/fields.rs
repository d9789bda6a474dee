//! Field reference substitution.
//!
//! Replaces `$$.className` tokens with the current value of a sibling field.

use formwork_core::{FieldReference, ResolvedFields};
use formwork_parser::scan_field_references;

/// Substitute every field reference in an expression body.
///
/// References outside a document path become single-quoted string literals;
/// inside a `%% … %%` path they are spliced in raw so the value becomes part
/// of the path. A class name with no resolved value becomes an empty string.
pub fn resolve_field_references(body: &str, fields: &ResolvedFields) -> String {
    let references = scan_field_references(body);
    if references.is_empty() {
        return body.to_string();
    }

    let mut resolved = body.to_string();
    for reference in references.iter().rev() {
        let replacement = substitution(reference, fields);
        resolved.replace_range(reference.span.start..reference.span.end, &replacement);
    }

    tracing::debug!(count = references.len(), "resolved field references");
    resolved
}

fn substitution(reference: &FieldReference, fields: &ResolvedFields) -> String {
    let text = match fields.get(&reference.class_name) {
        Some(value) => value.to_display_string(),
        None => {
            tracing::debug!(class_name = %reference.class_name, "unresolved field reference");
            String::new()
        }
    };

    if reference.in_path {
        text
    } else {
        quote_literal(&text)
    }
}

/// Render text as a single-quoted expression string literal.
pub fn quote_literal(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}
