//! Document and folder reference substitution.
//!
//! Every `%%path%%` token in a body is looked up concurrently. The pass
//! completes when all lookups have, and substitutions are applied by the
//! original position of each token.

use formwork_core::{DocumentReference, Notice, NoticeSink, StoreError};
use formwork_parser::scan_document_references;
use formwork_store::DocumentStore;
use futures::future::join_all;

/// Substitute every document and folder reference in an expression body.
///
/// - folder → JSON array of child names (short names preferred)
/// - document → JSON object of its structured data
/// - unsupported extension → empty text
/// - not found → token left in place
///
/// Failures are reported through `notices` and never abort the pass.
pub async fn resolve_document_references(
    body: &str,
    store: &dyn DocumentStore,
    notices: &dyn NoticeSink,
) -> String {
    let references = scan_document_references(body);
    if references.is_empty() {
        return body.to_string();
    }

    let lookups = references
        .iter()
        .map(|reference| lookup(reference, store, notices));
    let replacements = join_all(lookups).await;

    let mut resolved = body.to_string();
    for (reference, replacement) in references.iter().zip(replacements).rev() {
        if let Some(text) = replacement {
            resolved.replace_range(reference.span.start..reference.span.end, &text);
        }
    }

    tracing::debug!(count = references.len(), "resolved document references");
    resolved
}

/// Resolve one token. `None` leaves the token in place.
async fn lookup(
    reference: &DocumentReference,
    store: &dyn DocumentStore,
    notices: &dyn NoticeSink,
) -> Option<String> {
    if reference.is_folder() {
        let children = store
            .folder(&reference.path)
            .and_then(|folder| store.list_children(&folder));
        return match children {
            Ok(children) => {
                let names = children
                    .iter()
                    .map(|child| serde_json::Value::String(child.display_name().to_string()))
                    .collect();
                Some(serde_json::Value::Array(names).to_string())
            }
            Err(e) => {
                report(e, notices);
                None
            }
        };
    }

    let document = match store.document(&reference.path) {
        Ok(document) => document,
        Err(e @ StoreError::UnsupportedFormat { .. }) => {
            report(e, notices);
            return Some(String::new());
        }
        Err(e) => {
            report(e, notices);
            return None;
        }
    };

    match store.structured_data(&document).await {
        Ok(data) => Some(serde_json::Value::Object(data).to_string()),
        Err(e) => {
            report(e, notices);
            None
        }
    }
}

fn report(error: StoreError, notices: &dyn NoticeSink) {
    let notice = match error {
        StoreError::FolderNotFound { path } => Notice::FolderNotFound { path },
        StoreError::DocumentNotFound { path } => Notice::DocumentNotFound { path },
        StoreError::UnsupportedFormat { path, extension } => {
            Notice::UnsupportedExtension { path, extension }
        }
        other => {
            tracing::warn!(error = %other, "document lookup failed");
            return;
        }
    };
    notices.notify(notice);
}
