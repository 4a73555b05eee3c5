//! `emailNotification`: notify a group that a document was added.

use std::sync::Arc;

use tracing::info;

use docrules_core::document::site_of;
use docrules_core::DocumentHandle;
use docrules_rules::{DocumentRule, RuleError};

use crate::services::{GroupDirectory, MailService, Principal, TemplateEvaluator};

pub const RULE_ID: &str = "emailNotification";
pub const TO_PROPERTY: &str = "j:documentRuleTo";
pub const SUBJECT_PROPERTY: &str = "j:documentRuleSubject";
pub const BODY_PROPERTY: &str = "j:documentRuleBody";

pub const DEFAULT_SUBJECT: &str = "New document ${document.name}";
pub const DEFAULT_BODY: &str =
    "<p>The document <b>${document.name}</b> was added at ${document.path}.</p>";

pub struct EmailRule {
    mail: Arc<dyn MailService>,
    groups: Arc<dyn GroupDirectory>,
    templates: Arc<dyn TemplateEvaluator>,
    subject: String,
    body: String,
}

impl EmailRule {
    pub fn new(
        mail: Arc<dyn MailService>,
        groups: Arc<dyn GroupDirectory>,
        templates: Arc<dyn TemplateEvaluator>,
    ) -> Self {
        Self {
            mail,
            groups,
            templates,
            subject: DEFAULT_SUBJECT.to_string(),
            body: DEFAULT_BODY.to_string(),
        }
    }

    /// Subject used when the folder configures none.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Body used when the folder configures none.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    fn receivers(
        &self,
        document: &DocumentHandle<'_>,
        folder: &DocumentHandle<'_>,
    ) -> Result<Vec<String>, RuleError> {
        let group = match folder.property(TO_PROPERTY) {
            Some(value) => {
                let group_node = document
                    .session()
                    .node_by_id(value.to_reference(TO_PROPERTY)?)?;
                self.groups
                    .lookup_group(site_of(&group_node.path), &group_node.name)?
            }
            None => None,
        };

        let Some(group) = group else {
            info!(
                folder = %folder.path(),
                document = %document.path(),
                "no target group specified for the document rule; skipping"
            );
            return Ok(Vec::new());
        };

        Ok(group
            .members
            .iter()
            .filter_map(|member| match member {
                Principal::User(user) => user.notification_address().map(str::to_string),
                Principal::Group(_) => None,
            })
            .collect())
    }
}

impl DocumentRule for EmailRule {
    fn is_applicable(&self, _document: &DocumentHandle<'_>) -> bool {
        self.mail.is_enabled()
    }

    fn execute(&self, document: &DocumentHandle<'_>) -> Result<(), RuleError> {
        let folder = document.parent()?;
        let receivers = self.receivers(document, &folder)?;

        if receivers.is_empty() {
            info!(
                document = %document.path(),
                "no receivers found for the e-mail notification; skipping"
            );
            return Ok(());
        }

        let subject = folder.string_property(SUBJECT_PROPERTY).unwrap_or(self.subject.as_str());
        let body = folder.string_property(BODY_PROPERTY).unwrap_or(self.body.as_str());
        let subject = self.templates.evaluate(subject, document)?;
        let body = self.templates.evaluate(body, document)?;

        self.mail.send_html_message(&receivers, &subject, &body)?;
        Ok(())
    }
}
