//! Node and property model of the content repository.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{RepositoryError, RepositoryResult};
use crate::id::DocumentId;

/// A mixin type attached to a node.
///
/// Mixins form a shallow type hierarchy: a mixin "is" every type it extends.
/// Folder-level capability markers are expressed this way (a rule marker
/// extends the base "document rules apply here" marker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixinType {
    name: String,
    supertypes: BTreeSet<String>,
}

impl MixinType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertypes: BTreeSet::new(),
        }
    }

    /// Declare a supertype of this mixin.
    pub fn extending(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.insert(supertype.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supertypes(&self) -> &BTreeSet<String> {
        &self.supertypes
    }

    /// True if this mixin is `node_type` or extends it.
    pub fn is_node_type(&self, node_type: &str) -> bool {
        self.name == node_type || self.supertypes.contains(node_type)
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Strings(Vec<String>),
    Reference(DocumentId),
}

impl PropertyValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// String view of the value; `None` for non-string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean conversion.
    ///
    /// Accepts a boolean or the strings `true`/`false` (case-insensitive).
    pub fn to_bool(&self, property: &str) -> RepositoryResult<bool> {
        match self {
            PropertyValue::Bool(b) => Ok(*b),
            PropertyValue::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            PropertyValue::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(RepositoryError::value_format(property, "boolean")),
        }
    }

    pub fn to_reference(&self, property: &str) -> RepositoryResult<DocumentId> {
        match self {
            PropertyValue::Reference(id) => Ok(*id),
            PropertyValue::String(s) => s.parse(),
            _ => Err(RepositoryError::value_format(property, "reference")),
        }
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Folder,
    File {
        content_type: Option<String>,
        content: Vec<u8>,
    },
}

impl NodeKind {
    pub fn file(content_type: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::File {
            content_type: Some(content_type.into()),
            content: content.into(),
        }
    }
}

/// A node snapshot as read through a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: DocumentId,
    pub name: String,
    pub path: String,
    pub parent: Option<DocumentId>,
    pub kind: NodeKind,
    pub mixins: Vec<MixinType>,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Node {
    /// The workspace root folder (`/`).
    pub fn root() -> Self {
        Self {
            id: DocumentId::new(),
            name: String::new(),
            path: "/".to_string(),
            parent: None,
            kind: NodeKind::Folder,
            mixins: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// A new child of `parent` (path derived from the parent's path).
    pub fn child_of(parent: &Node, name: impl Into<String>, kind: NodeKind) -> Self {
        let name = name.into();
        let path = child_path(&parent.path, &name);
        Self {
            id: DocumentId::new(),
            name,
            path,
            parent: Some(parent.id),
            kind,
            mixins: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    pub fn content_type(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content_type, .. } => content_type.as_deref(),
            NodeKind::Folder => None,
        }
    }

    pub fn content(&self) -> Option<&[u8]> {
        match &self.kind {
            NodeKind::File { content, .. } => Some(content),
            NodeKind::Folder => None,
        }
    }

    /// True if any attached mixin is `node_type` or extends it.
    pub fn is_node_type(&self, node_type: &str) -> bool {
        self.mixins.iter().any(|m| m.is_node_type(node_type))
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Non-blank string property.
    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.property(name)
            .and_then(PropertyValue::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Attach a mixin unless one with the same name is already present.
    /// Returns whether the node changed.
    pub fn add_mixin(&mut self, mixin: MixinType) -> bool {
        if self.mixins.iter().any(|m| m.name == mixin.name) {
            return false;
        }
        self.mixins.push(mixin);
        true
    }
}

pub(crate) fn child_path(parent_path: &str, name: &str) -> String {
    if parent_path.ends_with('/') {
        format!("{parent_path}{name}")
    } else {
        format!("{parent_path}/{name}")
    }
}
