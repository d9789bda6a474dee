//! Document store interface for formwork.
//!
//! The expression engine reads two things from the outside world: the
//! structured data (front matter) of a document, and the names of the
//! children of a folder. This crate defines that interface and ships two
//! implementations:
//! - [`MemoryStore`], an in-memory store for tests and embedding
//! - [`VaultStore`], a directory of markdown files with YAML front matter

mod memory;
mod path;
mod traits;
mod vault;

pub use memory::MemoryStore;
pub use path::{extension, normalize_document_path, normalize_folder_path};
pub use traits::{ChildEntry, Document, DocumentStore, Folder, StructuredData};
pub use vault::{parse_front_matter, VaultStore};
