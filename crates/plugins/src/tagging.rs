//! `tagging`: tag documents with the tags configured on their folder.

use std::sync::Arc;

use tracing::{debug, info};

use docrules_core::{DocumentHandle, DocumentId, MixinType, PropertyValue, Session};
use docrules_rules::{DocumentRule, RuleError};

use crate::services::TaggingService;

pub const RULE_ID: &str = "tagging";
pub const TAGS_PROPERTY: &str = "j:documentRuleTags";
pub const TAGGED_MIXIN: &str = "jmix:tagged";
pub const DEFAULT_SITE: &str = "systemsite";

pub struct TaggingRule {
    tagging: Arc<dyn TaggingService>,
}

impl TaggingRule {
    pub fn new(tagging: Arc<dyn TaggingService>) -> Self {
        Self { tagging }
    }
}

impl DocumentRule for TaggingRule {
    fn is_applicable(&self, _document: &DocumentHandle<'_>) -> bool {
        true
    }

    fn execute(&self, document: &DocumentHandle<'_>) -> Result<(), RuleError> {
        let folder = document.parent()?;
        let tags = folder
            .string_property(TAGS_PROPERTY)
            .map(split_tags)
            .unwrap_or_default();

        if tags.is_empty() {
            info!(
                folder = %folder.path(),
                document = %document.path(),
                "no tags specified for the document rule; skipping"
            );
            return Ok(());
        }

        let session = document.session();
        if !document.is_node_type(TAGGED_MIXIN) {
            session.add_mixin(document.id(), MixinType::new(TAGGED_MIXIN))?;
        }

        let site = document.resolve_site().unwrap_or(DEFAULT_SITE);
        self.tagging.tag(session, document.id(), &tags, site)
    }
}

/// Split a tag list on spaces, commas and semicolons.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split([' ', ',', ';'])
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Stores tags on the node itself, as the `j:tags` string list.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyTaggingService;

impl PropertyTaggingService {
    pub const PROPERTY: &'static str = "j:tags";
}

impl TaggingService for PropertyTaggingService {
    fn tag(
        &self,
        session: &dyn Session,
        node: DocumentId,
        tags: &[String],
        site: &str,
    ) -> Result<(), RuleError> {
        let current = session.node_by_id(node)?;
        let mut merged = match current.property(Self::PROPERTY) {
            Some(PropertyValue::Strings(existing)) => existing.clone(),
            Some(PropertyValue::String(single)) => vec![single.clone()],
            _ => Vec::new(),
        };
        for tag in tags {
            if !merged.contains(tag) {
                merged.push(tag.clone());
            }
        }

        debug!(node = %current.path, site, tags = ?merged, "tagging node");
        session.set_property(node, Self::PROPERTY, PropertyValue::Strings(merged))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use docrules_core::{InMemoryContentRepository, InMemorySession, NodeKind, WorkspaceName};

    use super::*;

    #[derive(Default)]
    struct RecordingTagging {
        calls: Mutex<Vec<(Vec<String>, String)>>,
    }

    impl TaggingService for RecordingTagging {
        fn tag(
            &self,
            _session: &dyn Session,
            _node: DocumentId,
            tags: &[String],
            site: &str,
        ) -> Result<(), RuleError> {
            self.calls.lock().unwrap().push((tags.to_vec(), site.to_string()));
            Ok(())
        }
    }

    fn document_under(session: &InMemorySession, path: &[&str], tags: Option<&str>) -> DocumentId {
        let mut parent = session.root().unwrap().id;
        for segment in path {
            parent = session.add_node(parent, segment, NodeKind::Folder).unwrap().id;
        }
        if let Some(tags) = tags {
            session
                .set_property(parent, TAGS_PROPERTY, PropertyValue::string(tags))
                .unwrap();
        }
        session
            .add_node(parent, "a.txt", NodeKind::file("text/plain", b"a".to_vec()))
            .unwrap()
            .id
    }

    #[test]
    fn tags_are_split_on_separators() {
        assert_eq!(split_tags("a, b;;c  d"), vec!["a", "b", "c", "d"]);
        assert!(split_tags(" ,; ").is_empty());
    }

    #[test]
    fn tags_document_with_site_of_its_path() {
        let repo = InMemoryContentRepository::new();
        let session = repo.session(&WorkspaceName::new("default")).unwrap();
        let id = document_under(&session, &["sites", "acme", "files"], Some("q3 finance"));
        let tagging = Arc::new(RecordingTagging::default());

        TaggingRule::new(tagging.clone())
            .execute(&DocumentHandle::load(&session, id).unwrap())
            .unwrap();

        assert!(session.node_by_id(id).unwrap().is_node_type(TAGGED_MIXIN));
        let calls = tagging.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[(vec!["q3".to_string(), "finance".to_string()], "acme".to_string())]
        );
    }

    #[test]
    fn documents_outside_sites_use_the_system_site() {
        let repo = InMemoryContentRepository::new();
        let session = repo.session(&WorkspaceName::new("default")).unwrap();
        let id = document_under(&session, &["shared"], Some("x"));
        let tagging = Arc::new(RecordingTagging::default());

        TaggingRule::new(tagging.clone())
            .execute(&DocumentHandle::load(&session, id).unwrap())
            .unwrap();

        assert_eq!(tagging.calls.lock().unwrap()[0].1, DEFAULT_SITE);
    }

    #[test]
    fn no_tags_is_a_no_op() {
        let repo = InMemoryContentRepository::new();
        let session = repo.session(&WorkspaceName::new("default")).unwrap();
        let id = document_under(&session, &["shared"], None);
        let tagging = Arc::new(RecordingTagging::default());

        TaggingRule::new(tagging.clone())
            .execute(&DocumentHandle::load(&session, id).unwrap())
            .unwrap();

        assert!(tagging.calls.lock().unwrap().is_empty());
        assert!(!session.node_by_id(id).unwrap().is_node_type(TAGGED_MIXIN));
    }

    #[test]
    fn property_tagging_merges_with_existing_tags() {
        let repo = InMemoryContentRepository::new();
        let session = repo.session(&WorkspaceName::new("default")).unwrap();
        let id = document_under(&session, &["shared"], None);
        session
            .set_property(id, PropertyTaggingService::PROPERTY, PropertyValue::Strings(vec!["a".into()]))
            .unwrap();

        PropertyTaggingService
            .tag(&session, id, &["b".to_string(), "a".to_string()], DEFAULT_SITE)
            .unwrap();

        assert_eq!(
            session.node_by_id(id).unwrap().property(PropertyTaggingService::PROPERTY),
            Some(&PropertyValue::Strings(vec!["a".into(), "b".into()]))
        );
    }
}
