//! `docrules-core` — document model building blocks.
//!
//! Identifiers, the node/property model and the content repository contracts
//! that both the dispatcher and the rule plugins are written against, plus an
//! in-memory repository for tests/dev. No scheduling concerns live here.

pub mod document;
pub mod error;
pub mod id;
pub mod in_memory;
pub mod node;
pub mod session;

pub use document::{DocumentHandle, DocumentReference};
pub use error::{RepositoryError, RepositoryResult};
pub use id::{DocumentId, JobId, RuleId, WorkspaceName};
pub use in_memory::{InMemoryContentRepository, InMemorySession};
pub use node::{MixinType, Node, NodeKind, PropertyValue};
pub use session::{ContentRepository, Session};
