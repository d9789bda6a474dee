//! Store path normalization shared by every store implementation.

use formwork_core::{StoreError, FOLDER_SEPARATOR, MARKDOWN_EXTENSION};

/// Extension of the last path segment, if it has one.
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit(FOLDER_SEPARATOR).next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(dot) => Some(&name[dot + 1..]),
    }
}

/// Normalize a document path: no extension gets `.md`, `.md` is kept, any
/// other extension is unsupported.
pub fn normalize_document_path(path: &str) -> Result<String, StoreError> {
    let path = path.trim().trim_start_matches(FOLDER_SEPARATOR);
    match extension(path) {
        None => Ok(format!("{}.{}", path, MARKDOWN_EXTENSION)),
        Some(ext) if ext == MARKDOWN_EXTENSION => Ok(path.to_string()),
        Some(ext) => Err(StoreError::UnsupportedFormat {
            path: path.to_string(),
            extension: ext.to_string(),
        }),
    }
}

/// Normalize a folder path by dropping surrounding separators.
pub fn normalize_folder_path(path: &str) -> String {
    path.trim().trim_matches(FOLDER_SEPARATOR).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of_last_segment_only() {
        assert_eq!(extension("notes.v2/readme"), None);
        assert_eq!(extension("notes/readme.md"), Some("md"));
        assert_eq!(extension("notes/.obsidian"), None);
    }

    #[test]
    fn test_normalize_document_path() {
        assert_eq!(normalize_document_path("notes/a").unwrap(), "notes/a.md");
        assert_eq!(normalize_document_path("notes/a.md").unwrap(), "notes/a.md");
        match normalize_document_path("img/cat.png") {
            Err(StoreError::UnsupportedFormat { extension, .. }) => assert_eq!(extension, "png"),
            other => panic!("Expected unsupported format, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_folder_path() {
        assert_eq!(normalize_folder_path("notes/"), "notes");
        assert_eq!(normalize_folder_path("/"), "");
    }
}
