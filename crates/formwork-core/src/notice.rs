//! User-visible notices.
//!
//! Notices are a fire-and-forget side channel: emitting one never changes the
//! result of the operation that emitted it.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    FolderNotFound { path: String },
    DocumentNotFound { path: String },
    UnsupportedExtension { path: String, extension: String },
    EvaluationFailed { expression: String, reason: String },
    InvalidOptions { class_name: String, reason: String },
}

impl Notice {
    /// Short machine-friendly kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::FolderNotFound { .. } => "folder-not-found",
            Notice::DocumentNotFound { .. } => "document-not-found",
            Notice::UnsupportedExtension { .. } => "unsupported-extension",
            Notice::EvaluationFailed { .. } => "evaluation-error",
            Notice::InvalidOptions { .. } => "invalid-options",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::FolderNotFound { path } => write!(f, "Folder not found at {}", path),
            Notice::DocumentNotFound { path } => write!(f, "File not found at {}", path),
            Notice::UnsupportedExtension { extension, .. } => {
                write!(f, "Can't handle .{} extension, .md expected", extension)
            }
            Notice::EvaluationFailed { expression, .. } => {
                write!(f, "Error on evaluating {} expression", expression)
            }
            Notice::InvalidOptions { class_name, reason } => {
                write!(f, "Invalid options for {}: {}", class_name, reason)
            }
        }
    }
}

/// Receiver for notices.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Logs every notice through `tracing` and keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotices;

impl NoticeSink for LogNotices {
    fn notify(&self, notice: Notice) {
        tracing::warn!(kind = notice.kind(), "{}", notice);
    }
}

/// Collects notices so callers can inspect or display them later.
#[derive(Debug, Default)]
pub struct CollectedNotices {
    notices: Mutex<Vec<Notice>>,
}

impl CollectedNotices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything collected so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    /// Remove and return everything collected so far.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Notice>> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NoticeSink for CollectedNotices {
    fn notify(&self, notice: Notice) {
        tracing::debug!(kind = notice.kind(), "{}", notice);
        self.lock().push(notice);
    }
}
