//! `${document.*}` placeholder templates for notification subject and body.

use std::sync::OnceLock;

use docrules_core::DocumentHandle;
use regex::{Captures, Regex};

use crate::services::{ServiceError, TemplateEvaluator};

static PLACEHOLDER_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn placeholder_re() -> Result<&'static Regex, ServiceError> {
    PLACEHOLDER_RE
        .get_or_init(|| Regex::new(r"\$\{\s*([^}]*?)\s*\}"))
        .as_ref()
        .map_err(|e| ServiceError::new("templates", e.to_string()))
}

/// Substitutes `${document.<field>}` placeholders.
///
/// Known fields: `name`, `path`, `identifier`, `contentType`, `workspace`.
/// Unknown placeholders and unterminated `${` are left verbatim. Text
/// without any `${` is returned unchanged; otherwise the result is trimmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderTemplates;

impl PlaceholderTemplates {
    pub fn new() -> Self {
        Self
    }

    fn lookup(field: &str, document: &DocumentHandle<'_>) -> Option<String> {
        match field {
            "document.name" => Some(document.name().to_string()),
            "document.path" => Some(document.path().to_string()),
            "document.identifier" => Some(document.id().to_string()),
            "document.contentType" => Some(document.content_type().unwrap_or_default().to_string()),
            "document.workspace" => Some(document.workspace().to_string()),
            _ => None,
        }
    }
}

impl TemplateEvaluator for PlaceholderTemplates {
    fn evaluate(&self, template: &str, document: &DocumentHandle<'_>) -> Result<String, ServiceError> {
        if !template.contains("${") {
            return Ok(template.to_string());
        }

        let out = placeholder_re()?.replace_all(template, |caps: &Captures<'_>| {
            Self::lookup(&caps[1], document).unwrap_or_else(|| caps[0].to_string())
        });

        Ok(out.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use docrules_core::{InMemoryContentRepository, NodeKind, Session, WorkspaceName};

    use super::*;

    fn with_document<F: FnOnce(&DocumentHandle<'_>)>(f: F) {
        let repo = InMemoryContentRepository::new();
        let session = repo.session(&WorkspaceName::new("live")).unwrap();
        let root = session.root().unwrap();
        let node = session
            .add_node(root.id, "report.docx", NodeKind::file("application/msword", b"x".to_vec()))
            .unwrap();
        let document = DocumentHandle::load(&session, node.id).unwrap();
        f(&document);
    }

    #[test]
    fn known_placeholders_are_substituted() {
        with_document(|doc| {
            let out = PlaceholderTemplates
                .evaluate("  New ${document.name} at ${document.path} (${document.workspace}) ", doc)
                .unwrap();
            assert_eq!(out, "New report.docx at /report.docx (live)");

            let id = PlaceholderTemplates.evaluate("${document.identifier}", doc).unwrap();
            assert_eq!(id, doc.id().to_string());

            let mime = PlaceholderTemplates.evaluate("${ document.contentType }", doc).unwrap();
            assert_eq!(mime, "application/msword");
        });
    }

    #[test]
    fn plain_text_is_returned_unchanged() {
        with_document(|doc| {
            let out = PlaceholderTemplates.evaluate("  A new document  ", doc).unwrap();
            assert_eq!(out, "  A new document  ");
        });
    }

    #[test]
    fn repeated_and_adjacent_placeholders() {
        with_document(|doc| {
            let out = PlaceholderTemplates
                .evaluate("${document.name}${document.name} in ${document.workspace}", doc)
                .unwrap();
            assert_eq!(out, "report.docxreport.docx in live");
        });
    }

    #[test]
    fn unknown_and_unterminated_placeholders_stay() {
        with_document(|doc| {
            let out = PlaceholderTemplates
                .evaluate("${user.name} uploaded ${document.name", doc)
                .unwrap();
            assert_eq!(out, "${user.name} uploaded ${document.name");
        });
    }
}
