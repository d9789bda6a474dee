//! The document store trait and the handles it hands out.

use formwork_core::StoreError;
use futures::future::BoxFuture;

/// Front-matter-equivalent data of a document.
pub type StructuredData = serde_json::Map<String, serde_json::Value>;

/// A document that exists in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Document {
    /// Normalized path, extension included.
    pub path: String,
}

impl Document {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// File name without its extension.
    pub fn base_name(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        }
    }
}

/// A folder that exists in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Folder {
    /// Normalized path without a trailing separator. The root is `""`.
    pub path: String,
}

impl Folder {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    /// Full name, extension included.
    pub name: String,
    /// Short display name, when the store has one.
    pub base_name: Option<String>,
}

impl ChildEntry {
    pub fn new(name: impl Into<String>, base_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            base_name,
        }
    }

    /// The short name if there is one, otherwise the full name.
    pub fn display_name(&self) -> &str {
        self.base_name.as_deref().unwrap_or(&self.name)
    }
}

/// Read-only access to documents and folders.
///
/// Lookups are fallible with a not-found outcome. Only reading structured
/// data suspends; everything else answers immediately.
pub trait DocumentStore: Send + Sync {
    /// Look up a document. A path without an extension gets `.md`; any other
    /// extension is rejected with [`StoreError::UnsupportedFormat`] before
    /// the lookup.
    fn document(&self, path: &str) -> Result<Document, StoreError>;

    /// Look up a folder. A trailing separator is ignored.
    fn folder(&self, path: &str) -> Result<Folder, StoreError>;

    /// Read the structured data of a document.
    fn structured_data<'a>(
        &'a self,
        document: &'a Document,
    ) -> BoxFuture<'a, Result<StructuredData, StoreError>>;

    /// List the direct children of a folder, in store order.
    fn list_children(&self, folder: &Folder) -> Result<Vec<ChildEntry>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_base_name() {
        assert_eq!(Document::new("expenses/2024.01.md").base_name(), "2024.01");
        assert_eq!(Document::new("a.md").base_name(), "a");
        assert_eq!(Document::new(".hidden").base_name(), ".hidden");
    }

    #[test]
    fn test_child_display_name_prefers_base_name() {
        assert_eq!(ChildEntry::new("x.md", Some("x".to_string())).display_name(), "x");
        assert_eq!(ChildEntry::new("archive", None).display_name(), "archive");
    }
}
