//! Document handles and references.

use serde::{Deserialize, Serialize};

use crate::error::RepositoryResult;
use crate::id::{DocumentId, WorkspaceName};
use crate::node::{MixinType, Node, PropertyValue};
use crate::session::Session;

/// Minimal addressing token for a document: enough to re-resolve it later
/// from a new session of the same workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentReference {
    pub workspace: WorkspaceName,
    pub document_id: DocumentId,
}

impl DocumentReference {
    pub fn new(workspace: WorkspaceName, document_id: DocumentId) -> Self {
        Self {
            workspace,
            document_id,
        }
    }
}

impl core::fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.workspace, self.document_id)
    }
}

/// A live document: a node snapshot plus the session it was read through.
///
/// Rules read folder configuration and write derived content through the
/// handle's session. The snapshot is not updated by writes; call
/// [`DocumentHandle::refresh`] to re-read it.
#[derive(Clone)]
pub struct DocumentHandle<'s> {
    session: &'s dyn Session,
    node: Node,
}

impl<'s> DocumentHandle<'s> {
    pub fn new(session: &'s dyn Session, node: Node) -> Self {
        Self { session, node }
    }

    /// Resolve a document by identifier within `session`.
    pub fn load(session: &'s dyn Session, id: DocumentId) -> RepositoryResult<Self> {
        let node = session.node_by_id(id)?;
        Ok(Self::new(session, node))
    }

    pub fn session(&self) -> &'s dyn Session {
        self.session
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn id(&self) -> DocumentId {
        self.node.id
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn path(&self) -> &str {
        &self.node.path
    }

    pub fn workspace(&self) -> &WorkspaceName {
        self.session.workspace()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.node.content_type()
    }

    pub fn content(&self) -> Option<&[u8]> {
        self.node.content()
    }

    pub fn mixins(&self) -> &[MixinType] {
        &self.node.mixins
    }

    pub fn is_node_type(&self, node_type: &str) -> bool {
        self.node.is_node_type(node_type)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.node.properties.contains_key(name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.node.property(name)
    }

    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.node.string_property(name)
    }

    pub fn reference(&self) -> DocumentReference {
        DocumentReference::new(self.workspace().clone(), self.id())
    }

    /// The parent node, as a handle on the same session.
    pub fn parent(&self) -> RepositoryResult<DocumentHandle<'s>> {
        match self.node.parent {
            Some(parent) => Self::load(self.session, parent),
            None => Err(crate::RepositoryError::path_not_found(format!(
                "parent of {}",
                self.node.path
            ))),
        }
    }

    /// Re-read the node through the session.
    pub fn refresh(&self) -> RepositoryResult<DocumentHandle<'s>> {
        Self::load(self.session, self.node.id)
    }

    /// Site the document lives in, derived from a `/sites/<site>/...` path.
    pub fn resolve_site(&self) -> Option<&str> {
        site_of(&self.node.path)
    }
}

impl core::fmt::Debug for DocumentHandle<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("workspace", self.session.workspace())
            .field("node", &self.node)
            .finish()
    }
}

/// Site name of a repository path, if the path lives below `/sites`.
pub fn site_of(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/sites/")?;
    let site = rest.split('/').next()?;
    (!site.is_empty()).then_some(site)
}
