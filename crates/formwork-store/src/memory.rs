//! In-memory document store.

use crate::path::{normalize_document_path, normalize_folder_path};
use crate::traits::{ChildEntry, Document, DocumentStore, Folder, StructuredData};
use formwork_core::{StoreError, FOLDER_SEPARATOR};
use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;

/// A store held entirely in memory.
///
/// Folders are created implicitly for every document's ancestors; children
/// are listed in insertion order.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    documents: IndexMap<String, StructuredData>,
    folders: IndexMap<String, Vec<ChildEntry>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let mut folders = IndexMap::new();
        folders.insert(String::new(), Vec::new());
        Self {
            documents: IndexMap::new(),
            folders,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document. Non-object data is stored as an empty object.
    pub fn with_document(mut self, path: &str, data: serde_json::Value) -> Self {
        self.insert_document(path, data);
        self
    }

    /// Add an empty folder.
    pub fn with_folder(mut self, path: &str) -> Self {
        self.insert_folder(path);
        self
    }

    pub fn insert_document(&mut self, path: &str, data: serde_json::Value) {
        let path = normalize_document_path(path)
            .unwrap_or_else(|_| path.trim_start_matches(FOLDER_SEPARATOR).to_string());
        let data = match data {
            serde_json::Value::Object(map) => map,
            _ => StructuredData::new(),
        };

        let (parent, name) = split_parent(&path);
        let parent = parent.to_string();
        let base_name = Document::new(path.clone()).base_name().to_string();
        self.insert_folder(&parent);
        self.add_child(&parent, ChildEntry::new(name, Some(base_name)));
        self.documents.insert(path, data);
    }

    pub fn insert_folder(&mut self, path: &str) {
        let path = normalize_folder_path(path);
        if self.folders.contains_key(&path) {
            return;
        }
        if !path.is_empty() {
            let (parent, name) = split_parent(&path);
            let parent = parent.to_string();
            self.insert_folder(&parent);
            self.add_child(&parent, ChildEntry::new(name, None));
        }
        self.folders.insert(path, Vec::new());
    }

    fn add_child(&mut self, folder: &str, entry: ChildEntry) {
        if let Some(children) = self.folders.get_mut(folder) {
            if !children.iter().any(|c| c.name == entry.name) {
                children.push(entry);
            }
        }
    }
}

fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind(FOLDER_SEPARATOR) {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

impl DocumentStore for MemoryStore {
    fn document(&self, path: &str) -> Result<Document, StoreError> {
        let path = normalize_document_path(path)?;
        if self.documents.contains_key(&path) {
            Ok(Document::new(path))
        } else {
            Err(StoreError::DocumentNotFound { path })
        }
    }

    fn folder(&self, path: &str) -> Result<Folder, StoreError> {
        let path = normalize_folder_path(path);
        if self.folders.contains_key(&path) {
            Ok(Folder::new(path))
        } else {
            Err(StoreError::FolderNotFound { path })
        }
    }

    fn structured_data<'a>(
        &'a self,
        document: &'a Document,
    ) -> BoxFuture<'a, Result<StructuredData, StoreError>> {
        let result = self
            .documents
            .get(&document.path)
            .cloned()
            .ok_or_else(|| StoreError::DocumentNotFound {
                path: document.path.clone(),
            });
        future::ready(result).boxed()
    }

    fn list_children(&self, folder: &Folder) -> Result<Vec<ChildEntry>, StoreError> {
        self.folders
            .get(&folder.path)
            .cloned()
            .ok_or_else(|| StoreError::FolderNotFound {
                path: folder.path.clone(),
            })
    }
}
