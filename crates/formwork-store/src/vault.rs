//! A store backed by a directory of markdown files.

use crate::path::{normalize_document_path, normalize_folder_path};
use crate::traits::{ChildEntry, Document, DocumentStore, Folder, StructuredData};
use formwork_core::{StoreError, FOLDER_SEPARATOR};
use futures::future::{BoxFuture, FutureExt};
use std::fs;
use std::path::{Path, PathBuf};

const FRONT_MATTER_FENCE: &str = "---";

/// Documents are `.md` files under `root`; their leading YAML block is the
/// structured data. Folders are directories.
#[derive(Debug, Clone)]
pub struct VaultStore {
    root: PathBuf,
}

impl VaultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a store path onto the file system. Paths that climb out of the
    /// root resolve to nothing.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let mut full = self.root.clone();
        for segment in path.split(FOLDER_SEPARATOR).filter(|s| !s.is_empty()) {
            if segment == ".." || segment == "." {
                return None;
            }
            full.push(segment);
        }
        Some(full)
    }
}

impl DocumentStore for VaultStore {
    fn document(&self, path: &str) -> Result<Document, StoreError> {
        let path = normalize_document_path(path)?;
        match self.resolve(&path) {
            Some(full) if full.is_file() => Ok(Document::new(path)),
            _ => Err(StoreError::DocumentNotFound { path }),
        }
    }

    fn folder(&self, path: &str) -> Result<Folder, StoreError> {
        let path = normalize_folder_path(path);
        match self.resolve(&path) {
            Some(full) if full.is_dir() => Ok(Folder::new(path)),
            _ => Err(StoreError::FolderNotFound { path }),
        }
    }

    fn structured_data<'a>(
        &'a self,
        document: &'a Document,
    ) -> BoxFuture<'a, Result<StructuredData, StoreError>> {
        async move {
            let full = self
                .resolve(&document.path)
                .ok_or_else(|| StoreError::DocumentNotFound {
                    path: document.path.clone(),
                })?;
            let content = fs::read_to_string(&full).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => StoreError::DocumentNotFound {
                    path: document.path.clone(),
                },
                _ => StoreError::Io(e),
            })?;
            tracing::debug!(path = %document.path, bytes = content.len(), "read document");
            parse_front_matter(&document.path, &content)
        }
        .boxed()
    }

    fn list_children(&self, folder: &Folder) -> Result<Vec<ChildEntry>, StoreError> {
        let full = self
            .resolve(&folder.path)
            .ok_or_else(|| StoreError::FolderNotFound {
                path: folder.path.clone(),
            })?;

        let mut children = Vec::new();
        for entry in fs::read_dir(&full)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let base_name = if entry.file_type()?.is_dir() {
                Some(name.clone())
            } else {
                Path::new(&name)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            };
            children.push(ChildEntry::new(name, base_name));
        }

        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }
}

/// Extract the leading `---` YAML block of a markdown document as an object.
///
/// A document without a closed front matter block has no structured data.
pub fn parse_front_matter(path: &str, content: &str) -> Result<StructuredData, StoreError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines();
    if lines.next().map(str::trim_end) != Some(FRONT_MATTER_FENCE) {
        return Ok(StructuredData::new());
    }

    let mut yaml = String::new();
    let mut closed = false;
    for line in lines {
        if line.trim_end() == FRONT_MATTER_FENCE {
            closed = true;
            break;
        }
        yaml.push_str(line);
        yaml.push('\n');
    }
    if !closed || yaml.trim().is_empty() {
        return Ok(StructuredData::new());
    }

    let invalid = |reason: String| StoreError::InvalidData {
        path: path.to_string(),
        reason,
    };
    match serde_yaml::from_str::<serde_json::Value>(&yaml) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(serde_json::Value::Null) => Ok(StructuredData::new()),
        Ok(other) => Err(invalid(format!("front matter is not a mapping: {}", other))),
        Err(e) => Err(invalid(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;
    use tempfile::TempDir;

    fn vault() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes");
        fs::create_dir_all(notes.join("archive")).unwrap();
        fs::write(
            notes.join("y.md"),
            "---\ntitle: Why\ntags:\n  - a\n  - b\ncount: 3\n---\n# Body\n",
        )
        .unwrap();
        fs::write(notes.join("x.md"), "no front matter here\n").unwrap();
        fs::write(notes.join(".hidden.md"), "").unwrap();
        dir
    }

    #[test]
    fn test_front_matter_becomes_object() {
        let data = parse_front_matter("a.md", "---\nname: A\nsize: 2\n---\ntext").unwrap();
        assert_eq!(serde_json::Value::Object(data), json!({"name": "A", "size": 2}));
    }

    #[test]
    fn test_unclosed_front_matter_is_empty() {
        assert!(parse_front_matter("a.md", "---\nname: A\n").unwrap().is_empty());
        assert!(parse_front_matter("a.md", "---\n---\n").unwrap().is_empty());
    }

    #[test]
    fn test_scalar_front_matter_is_invalid() {
        assert!(matches!(
            parse_front_matter("a.md", "---\njust text\n---\n"),
            Err(StoreError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_vault_reads_documents() {
        let dir = vault();
        let store = VaultStore::new(dir.path());
        let doc = store.document("notes/y").unwrap();
        let data = block_on(store.structured_data(&doc)).unwrap();
        assert_eq!(data.get("tags"), Some(&json!(["a", "b"])));

        let doc = store.document("notes/x.md").unwrap();
        assert!(block_on(store.structured_data(&doc)).unwrap().is_empty());
    }

    #[test]
    fn test_vault_missing_document() {
        let dir = vault();
        let store = VaultStore::new(dir.path());
        assert!(store.document("notes/z").unwrap_err().is_not_found());
        assert!(store.document("../outside").unwrap_err().is_not_found());
    }

    #[test]
    fn test_vault_lists_children_sorted() {
        let dir = vault();
        let store = VaultStore::new(dir.path());
        let folder = store.folder("notes/").unwrap();
        let names: Vec<_> = store
            .list_children(&folder)
            .unwrap()
            .iter()
            .map(|c| c.display_name().to_string())
            .collect();
        assert_eq!(names, vec!["archive", "x", "y"]);
    }

    #[test]
    fn test_vault_missing_folder() {
        let dir = vault();
        let store = VaultStore::new(dir.path());
        assert!(store.folder("nope/").unwrap_err().is_not_found());
    }
}
