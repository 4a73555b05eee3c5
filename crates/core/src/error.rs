//! Content repository error model.

use thiserror::Error;

use crate::id::{DocumentId, WorkspaceName};

/// Result type used by sessions and document handles.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Content repository error.
///
/// Raised by session operations and by typed property access. Callers that
/// isolate rule failures treat every variant the same way; the split exists
/// for logs and tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No node with this identifier exists in the session's workspace.
    #[error("item not found: {0}")]
    NotFound(DocumentId),

    /// The repository has no workspace with this name.
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(WorkspaceName),

    /// No node exists at this path.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// A sibling with the same name already exists.
    #[error("item already exists: {0}")]
    ItemExists(String),

    /// Children can only be added below folders.
    #[error("not a folder: {0}")]
    NotAFolder(String),

    /// A property holds a value of an unexpected type.
    #[error("property {property} is not a valid {expected}")]
    ValueFormat {
        property: String,
        expected: &'static str,
    },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The backing store failed (poisoned lock, IO, ...).
    #[error("storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound(path.into())
    }

    pub fn item_exists(path: impl Into<String>) -> Self {
        Self::ItemExists(path.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn value_format(property: impl Into<String>, expected: &'static str) -> Self {
        Self::ValueFormat {
            property: property.into(),
            expected,
        }
    }
}
