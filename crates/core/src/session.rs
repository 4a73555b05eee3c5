//! Content repository contracts.
//!
//! The repository that stores documents and folder configuration is an
//! external collaborator. Everything in this workspace talks to it through
//! these two traits:
//!
//! - [`ContentRepository`] opens workspace-scoped system sessions (used when a
//!   background job resumes and the triggering session is long gone).
//! - [`Session`] is a unit of work: reads see the session's own staged changes,
//!   and nothing becomes visible to other sessions until [`Session::save`].
//!
//! Methods take `&self`; implementations use interior mutability so a session
//! can be shared by a document handle and the rule operating on it.

use crate::error::RepositoryResult;
use crate::id::{DocumentId, WorkspaceName};
use crate::node::{MixinType, Node, NodeKind, PropertyValue};

pub trait Session: Send + Sync {
    /// Workspace this session is bound to.
    fn workspace(&self) -> &WorkspaceName;

    /// The workspace root folder.
    fn root(&self) -> RepositoryResult<Node>;

    fn node_by_id(&self, id: DocumentId) -> RepositoryResult<Node>;

    fn node_by_path(&self, path: &str) -> RepositoryResult<Node>;

    /// Direct children of a node, ordered by name.
    fn children(&self, parent: DocumentId) -> RepositoryResult<Vec<Node>>;

    /// Direct child by name.
    fn child(&self, parent: DocumentId, name: &str) -> RepositoryResult<Option<Node>> {
        Ok(self
            .children(parent)?
            .into_iter()
            .find(|n| n.name == name))
    }

    /// Create a node below a folder. Sibling names are unique.
    fn add_node(&self, parent: DocumentId, name: &str, kind: NodeKind) -> RepositoryResult<Node>;

    /// Remove a node and everything below it.
    fn remove(&self, id: DocumentId) -> RepositoryResult<()>;

    fn add_mixin(&self, id: DocumentId, mixin: MixinType) -> RepositoryResult<()>;

    fn set_property(&self, id: DocumentId, name: &str, value: PropertyValue)
    -> RepositoryResult<()>;

    /// Publish staged changes.
    fn save(&self) -> RepositoryResult<()>;
}

/// Entry point into the content repository.
pub trait ContentRepository: Send + Sync {
    /// Open a fresh system-level session scoped to `workspace`.
    fn system_session(&self, workspace: &WorkspaceName) -> RepositoryResult<Box<dyn Session>>;
}

impl<R> ContentRepository for std::sync::Arc<R>
where
    R: ContentRepository + ?Sized,
{
    fn system_session(&self, workspace: &WorkspaceName) -> RepositoryResult<Box<dyn Session>> {
        (**self).system_session(workspace)
    }
}
