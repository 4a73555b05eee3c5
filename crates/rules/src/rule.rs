use std::any::Any;

use docrules_core::{DocumentHandle, RepositoryError};
use thiserror::Error;

/// A rule executed on a document.
///
/// Implementations hold no dispatch logic: they are told *whether* they
/// apply and then asked to run. The same instance serves inline dispatch and
/// background jobs, possibly from several threads at once.
///
/// ## Applicability
///
/// `is_applicable` must be cheap and side-effect free. Ordinary "does not
/// apply" cases (no content type, backing service disabled, ...) are logged
/// by the rule and answered with `false`, never with an error.
///
/// ## Idempotence
///
/// Running a rule twice is not guaranteed to be a no-op (a second
/// notification may be sent). Nothing in the dispatch path re-delivers a
/// request, so rules are not required to be idempotent.
pub trait DocumentRule: Send + Sync {
    fn is_applicable(&self, document: &DocumentHandle<'_>) -> bool;

    fn execute(&self, document: &DocumentHandle<'_>) -> Result<(), RuleError>;
}

/// Failure of a rule's side effect.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A backend service (converter, mail, tagging) failed.
    #[error("{service} failed: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    /// Folder or rule configuration is unusable.
    #[error("invalid rule configuration: {0}")]
    Configuration(String),

    /// The rule panicked while checking applicability or executing.
    #[error("rule panicked: {0}")]
    Panicked(String),
}

impl RuleError {
    pub fn service(service: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            service,
            message: message.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build from a payload caught by `catch_unwind`.
    pub fn panicked(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked(message)
    }
}
