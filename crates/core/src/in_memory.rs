//! In-memory content repository for tests/dev.
//!
//! - Workspaces are created by the first [`InMemoryContentRepository::session`],
//!   each with a root folder `/`. System sessions only open existing ones.
//! - Sessions stage writes; `save` publishes them (last write wins per node).
//! - No locking between sessions: two sessions saving the same node both
//!   succeed and the later one is what remains.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{RepositoryError, RepositoryResult};
use crate::id::{DocumentId, WorkspaceName};
use crate::node::{MixinType, Node, NodeKind, PropertyValue, child_path};
use crate::session::{ContentRepository, Session};

#[derive(Debug)]
struct Workspace {
    root: DocumentId,
    nodes: HashMap<DocumentId, Node>,
}

impl Workspace {
    fn new() -> Self {
        let root = Node::root();
        let id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(id, root);
        Self { root: id, nodes }
    }
}

type Workspaces = Arc<RwLock<HashMap<WorkspaceName, Workspace>>>;

#[derive(Debug, Clone, Default)]
pub struct InMemoryContentRepository {
    workspaces: Workspaces,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Open a session, creating the workspace if it does not exist yet.
    pub fn session(&self, workspace: &WorkspaceName) -> RepositoryResult<InMemorySession> {
        let mut all = self
            .workspaces
            .write()
            .map_err(|_| RepositoryError::storage("workspace lock poisoned"))?;
        let root = all
            .entry(workspace.clone())
            .or_insert_with(Workspace::new)
            .root;
        Ok(self.open(workspace, root))
    }

    /// Open a session on an existing workspace.
    pub fn existing_session(&self, workspace: &WorkspaceName) -> RepositoryResult<InMemorySession> {
        let all = self
            .workspaces
            .read()
            .map_err(|_| RepositoryError::storage("workspace lock poisoned"))?;
        let root = all
            .get(workspace)
            .ok_or_else(|| RepositoryError::WorkspaceNotFound(workspace.clone()))?
            .root;
        Ok(self.open(workspace, root))
    }

    fn open(&self, workspace: &WorkspaceName, root: DocumentId) -> InMemorySession {
        InMemorySession {
            workspaces: self.workspaces.clone(),
            workspace: workspace.clone(),
            root,
            staged: Mutex::new(Staged::default()),
        }
    }

    /// Committed snapshot of a node, bypassing sessions.
    pub fn committed(&self, workspace: &WorkspaceName, id: DocumentId) -> Option<Node> {
        let all = self.workspaces.read().ok()?;
        all.get(workspace)?.nodes.get(&id).cloned()
    }

    /// Committed snapshot of a node by path, bypassing sessions.
    pub fn committed_by_path(&self, workspace: &WorkspaceName, path: &str) -> Option<Node> {
        let all = self.workspaces.read().ok()?;
        all.get(workspace)?
            .nodes
            .values()
            .find(|n| n.path == path)
            .cloned()
    }
}

impl ContentRepository for InMemoryContentRepository {
    fn system_session(&self, workspace: &WorkspaceName) -> RepositoryResult<Box<dyn Session>> {
        Ok(Box::new(self.existing_session(workspace)?))
    }
}

#[derive(Debug, Default)]
struct Staged {
    upserts: HashMap<DocumentId, Node>,
    removed: HashSet<DocumentId>,
}

/// Session over [`InMemoryContentRepository`].
#[derive(Debug)]
pub struct InMemorySession {
    workspaces: Workspaces,
    workspace: WorkspaceName,
    root: DocumentId,
    staged: Mutex<Staged>,
}

impl InMemorySession {
    fn with_view<T>(
        &self,
        f: impl FnOnce(&Workspace, &Staged) -> RepositoryResult<T>,
    ) -> RepositoryResult<T> {
        let all = self
            .workspaces
            .read()
            .map_err(|_| RepositoryError::storage("workspace lock poisoned"))?;
        let ws = all
            .get(&self.workspace)
            .ok_or_else(|| RepositoryError::storage(format!("workspace {} vanished", self.workspace)))?;
        let staged = self
            .staged
            .lock()
            .map_err(|_| RepositoryError::storage("session lock poisoned"))?;
        f(ws, &staged)
    }

    fn staged(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Staged>> {
        self.staged
            .lock()
            .map_err(|_| RepositoryError::storage("session lock poisoned"))
    }

    /// Current view of a node: staged copy first, then committed.
    fn lookup(ws: &Workspace, staged: &Staged, id: DocumentId) -> Option<Node> {
        if staged.removed.contains(&id) {
            return None;
        }
        staged
            .upserts
            .get(&id)
            .or_else(|| ws.nodes.get(&id))
            .cloned()
    }

    fn visible_nodes(ws: &Workspace, staged: &Staged) -> Vec<Node> {
        let mut nodes: HashMap<DocumentId, Node> = ws
            .nodes
            .iter()
            .filter(|(id, _)| !staged.removed.contains(id))
            .map(|(id, n)| (*id, n.clone()))
            .collect();
        for (id, node) in &staged.upserts {
            nodes.insert(*id, node.clone());
        }
        nodes.into_values().collect()
    }

    fn update_node(
        &self,
        id: DocumentId,
        f: impl FnOnce(&mut Node),
    ) -> RepositoryResult<()> {
        let mut node = self.node_by_id(id)?;
        f(&mut node);
        self.staged()?.upserts.insert(id, node);
        Ok(())
    }
}

impl Session for InMemorySession {
    fn workspace(&self) -> &WorkspaceName {
        &self.workspace
    }

    fn root(&self) -> RepositoryResult<Node> {
        self.node_by_id(self.root)
    }

    fn node_by_id(&self, id: DocumentId) -> RepositoryResult<Node> {
        self.with_view(|ws, staged| {
            Self::lookup(ws, staged, id).ok_or(RepositoryError::NotFound(id))
        })
    }

    fn node_by_path(&self, path: &str) -> RepositoryResult<Node> {
        self.with_view(|ws, staged| {
            Self::visible_nodes(ws, staged)
                .into_iter()
                .find(|n| n.path == path)
                .ok_or_else(|| RepositoryError::path_not_found(path))
        })
    }

    fn children(&self, parent: DocumentId) -> RepositoryResult<Vec<Node>> {
        self.with_view(|ws, staged| {
            let mut children: Vec<_> = Self::visible_nodes(ws, staged)
                .into_iter()
                .filter(|n| n.parent == Some(parent))
                .collect();
            children.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(children)
        })
    }

    fn add_node(&self, parent: DocumentId, name: &str, kind: NodeKind) -> RepositoryResult<Node> {
        let parent = self.node_by_id(parent)?;
        if !parent.is_folder() {
            return Err(RepositoryError::NotAFolder(parent.path));
        }
        if self.child(parent.id, name)?.is_some() {
            return Err(RepositoryError::item_exists(child_path(&parent.path, name)));
        }
        let node = Node::child_of(&parent, name, kind);
        self.staged()?.upserts.insert(node.id, node.clone());
        Ok(node)
    }

    fn remove(&self, id: DocumentId) -> RepositoryResult<()> {
        let node = self.node_by_id(id)?;
        let prefix = child_path(&node.path, "");
        let doomed: Vec<DocumentId> = self.with_view(|ws, staged| {
            Ok(Self::visible_nodes(ws, staged)
                .into_iter()
                .filter(|n| n.id == id || n.path.starts_with(&prefix))
                .map(|n| n.id)
                .collect())
        })?;
        let mut staged = self.staged()?;
        for id in doomed {
            staged.upserts.remove(&id);
            staged.removed.insert(id);
        }
        Ok(())
    }

    fn add_mixin(&self, id: DocumentId, mixin: MixinType) -> RepositoryResult<()> {
        self.update_node(id, |node| {
            node.add_mixin(mixin);
        })
    }

    fn set_property(
        &self,
        id: DocumentId,
        name: &str,
        value: PropertyValue,
    ) -> RepositoryResult<()> {
        self.update_node(id, |node| {
            node.properties.insert(name.to_string(), value);
        })
    }

    fn save(&self) -> RepositoryResult<()> {
        let mut all = self
            .workspaces
            .write()
            .map_err(|_| RepositoryError::storage("workspace lock poisoned"))?;
        let ws = all
            .get_mut(&self.workspace)
            .ok_or_else(|| RepositoryError::storage(format!("workspace {} vanished", self.workspace)))?;
        let mut staged = self.staged()?;
        for id in staged.removed.drain() {
            ws.nodes.remove(&id);
        }
        for (id, node) in staged.upserts.drain() {
            ws.nodes.insert(id, node);
        }
        Ok(())
    }
}
