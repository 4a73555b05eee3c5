//! Backend-service contracts used by the bundled rules.

use docrules_core::{DocumentHandle, DocumentId, Session};
use docrules_rules::RuleError;

/// Failure reported by a backend service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{service}: {message}")]
pub struct ServiceError {
    pub service: &'static str,
    pub message: String,
}

impl ServiceError {
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for RuleError {
    fn from(e: ServiceError) -> Self {
        RuleError::service(e.service, e.message)
    }
}

/// Office document conversion.
pub trait DocumentConverter: Send + Sync {
    fn is_enabled(&self) -> bool;

    /// Convert `content` from one MIME type to another. `Ok(None)` means the
    /// converter produced nothing.
    fn convert(&self, content: &[u8], from: &str, to: &str) -> Result<Option<Vec<u8>>, ServiceError>;
}

pub trait MailService: Send + Sync {
    fn is_enabled(&self) -> bool;

    fn send_html_message(&self, to: &[String], subject: &str, body: &str) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub email: Option<String>,
    pub email_notifications_disabled: bool,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: Some(email.into()),
            email_notifications_disabled: false,
        }
    }

    /// Address to notify, if the user has one and accepts notifications.
    pub fn notification_address(&self) -> Option<&str> {
        if self.email_notifications_disabled {
            return None;
        }
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// Group member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    User(User),
    /// Nested group, by name. Not expanded for notifications.
    Group(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub site: Option<String>,
    pub members: Vec<Principal>,
}

pub trait GroupDirectory: Send + Sync {
    /// Look a group up by name, scoped to a site (`None` for global groups).
    fn lookup_group(&self, site: Option<&str>, name: &str) -> Result<Option<Group>, ServiceError>;
}

pub trait TaggingService: Send + Sync {
    /// Attach `tags` to a node through `session`. The session is not saved.
    fn tag(
        &self,
        session: &dyn Session,
        node: DocumentId,
        tags: &[String],
        site: &str,
    ) -> Result<(), RuleError>;
}

/// Evaluates subject/body templates against a document.
pub trait TemplateEvaluator: Send + Sync {
    fn evaluate(&self, template: &str, document: &DocumentHandle<'_>) -> Result<String, ServiceError>;
}
