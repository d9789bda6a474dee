//! Templated string splitting and reference token scanning.

use formwork_core::{
    DocumentReference, FieldReference, Span, DOCUMENT_MARKER, EXPRESSION_END, EXPRESSION_START,
    FIELD_REFERENCE_PREFIX,
};

/// A templated string split around its expression region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template<'a> {
    pub prefix: &'a str,
    /// Text between the markers; empty when there is nothing to evaluate.
    pub body: &'a str,
    pub suffix: &'a str,
}

impl<'a> Template<'a> {
    /// Whether there is an expression to evaluate.
    pub fn has_expression(&self) -> bool {
        !self.body.is_empty()
    }

    /// Whether any literal text surrounds the expression.
    pub fn has_literal(&self) -> bool {
        !self.prefix.is_empty() || !self.suffix.is_empty()
    }

    fn literal(input: &'a str) -> Self {
        Self {
            prefix: input,
            body: "",
            suffix: "",
        }
    }
}

/// Split a templated string into prefix, expression body and suffix.
///
/// Only the first `{{` and the first `}}` after it are honored. Without a
/// complete pair the whole input is literal prefix. A blank body counts as no
/// expression.
pub fn split_template(input: &str) -> Template<'_> {
    let Some(start) = input.find(EXPRESSION_START) else {
        return Template::literal(input);
    };
    let body_start = start + EXPRESSION_START.len();
    let Some(end) = input[body_start..].find(EXPRESSION_END).map(|i| i + body_start) else {
        return Template::literal(input);
    };

    let body = &input[body_start..end];
    Template {
        prefix: &input[..start],
        body: if body.trim().is_empty() { "" } else { body },
        suffix: &input[end + EXPRESSION_END.len()..],
    }
}

/// Find every `%%path%%` token in an expression body.
///
/// Markers pair up left to right; a trailing unpaired marker is ignored.
pub fn scan_document_references(body: &str) -> Vec<DocumentReference> {
    let markers: Vec<usize> = body.match_indices(DOCUMENT_MARKER).map(|(i, _)| i).collect();

    markers
        .chunks_exact(2)
        .map(|pair| {
            let (open, close) = (pair[0], pair[1]);
            DocumentReference {
                path: body[open + DOCUMENT_MARKER.len()..close].to_string(),
                span: Span::new(open, close + DOCUMENT_MARKER.len()),
            }
        })
        .collect()
}

/// Find every `$$.className` token in an expression body.
///
/// The class name is the longest run of ASCII letters, digits, `_` and `-`
/// after the prefix. A token counts as part of a path when it lies inside a
/// `%% … %%` pair.
pub fn scan_field_references(body: &str) -> Vec<FieldReference> {
    let paths = scan_document_references(body);
    let mut references = Vec::new();

    for (start, _) in body.match_indices(FIELD_REFERENCE_PREFIX) {
        let name_start = start + FIELD_REFERENCE_PREFIX.len();
        let name_len = body[name_start..]
            .find(|c: char| !is_class_name_char(c))
            .unwrap_or(body.len() - name_start);
        if name_len == 0 {
            continue;
        }

        let span = Span::new(start, name_start + name_len);
        let in_path = paths
            .iter()
            .any(|p| p.span.start < span.start && span.end <= p.span.end);

        references.push(FieldReference {
            class_name: body[name_start..span.end].to_string(),
            span,
            in_path,
        });
    }

    references
}

fn is_class_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
