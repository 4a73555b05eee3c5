//! `createPDF`: store a PDF rendition of an office document.

use std::sync::Arc;

use tracing::{debug, warn};

use docrules_core::{DocumentHandle, DocumentId, NodeKind, Session};
use docrules_rules::{DocumentRule, RuleError};

use crate::mime::MimeGroups;
use crate::services::DocumentConverter;

pub const RULE_ID: &str = "createPDF";
pub const SUBFOLDER_PROPERTY: &str = "j:documentRuleSubfolder";
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Formats converted unless configured otherwise.
pub const DEFAULT_FORMATS: [&str; 5] = ["word", "openoffice", "rtf", "excel", "powerpoint"];

pub struct CreatePdfRule {
    converter: Arc<dyn DocumentConverter>,
    mime_groups: MimeGroups,
    supported_formats: Vec<String>,
    overwrite_if_exists: bool,
}

impl CreatePdfRule {
    pub fn new(converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            converter,
            mime_groups: MimeGroups::default(),
            supported_formats: DEFAULT_FORMATS.iter().map(|f| f.to_string()).collect(),
            overwrite_if_exists: true,
        }
    }

    /// MIME groups or literal patterns to convert. An empty list converts
    /// nothing.
    pub fn with_supported_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mime_groups(mut self, mime_groups: MimeGroups) -> Self {
        self.mime_groups = mime_groups;
        self
    }

    /// Replace an existing PDF of the same name (default), or pick a free
    /// name next to it.
    pub fn with_overwrite_if_exists(mut self, overwrite: bool) -> Self {
        self.overwrite_if_exists = overwrite;
        self
    }

    /// Parent folder, or its configured subfolder (created when missing).
    fn target_folder(&self, document: &DocumentHandle<'_>) -> Result<DocumentId, RuleError> {
        let session = document.session();
        let folder = document.parent()?;

        let Some(subfolder) = folder.string_property(SUBFOLDER_PROPERTY) else {
            return Ok(folder.id());
        };
        match session.child(folder.id(), subfolder)? {
            Some(existing) if existing.is_folder() => Ok(existing.id),
            Some(existing) => Err(RuleError::configuration(format!(
                "{SUBFOLDER_PROPERTY} points at {}, which is not a folder",
                existing.path
            ))),
            None => Ok(session.add_node(folder.id(), subfolder, NodeKind::Folder)?.id),
        }
    }

    fn target_name(
        &self,
        session: &dyn Session,
        folder: DocumentId,
        document_name: &str,
    ) -> Result<String, RuleError> {
        let base = pdf_base_name(document_name);
        let name = format!("{base}.pdf");

        if self.overwrite_if_exists {
            if let Some(existing) = session.child(folder, &name)? {
                session.remove(existing.id)?;
            }
            return Ok(name);
        }

        if session.child(folder, &name)?.is_none() {
            return Ok(name);
        }
        let mut n = 1u32;
        loop {
            let candidate = format!("{base}-{n}.pdf");
            if session.child(folder, &candidate)?.is_none() {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

impl DocumentRule for CreatePdfRule {
    fn is_applicable(&self, document: &DocumentHandle<'_>) -> bool {
        if !self.converter.is_enabled() {
            warn!(
                document = %document.path(),
                "document converter service is not enabled; skip converting document"
            );
            return false;
        }

        let Some(mime_type) = document.content_type() else {
            warn!(
                document = %document.path(),
                "document has no MIME type defined; skip converting document"
            );
            return false;
        };

        self.mime_groups
            .matches(Some(mime_type), &self.supported_formats)
    }

    fn execute(&self, document: &DocumentHandle<'_>) -> Result<(), RuleError> {
        let Some(mime_type) = document.content_type() else {
            return Ok(());
        };
        let content = document.content().unwrap_or_default();

        let Some(pdf) = self.converter.convert(content, mime_type, PDF_MIME_TYPE)? else {
            debug!(document = %document.path(), "converter produced no PDF output");
            return Ok(());
        };

        let session = document.session();
        let folder = self.target_folder(document)?;
        let name = self.target_name(session, folder, document.name())?;
        let node = session.add_node(folder, &name, NodeKind::file(PDF_MIME_TYPE, pdf))?;

        debug!(
            document = %document.path(),
            pdf = %node.path,
            "converted document to PDF"
        );
        Ok(())
    }
}

impl core::fmt::Debug for CreatePdfRule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CreatePdfRule")
            .field("supported_formats", &self.supported_formats)
            .field("overwrite_if_exists", &self.overwrite_if_exists)
            .finish_non_exhaustive()
    }
}

/// `report.final.docx` -> `report.final`; names without a dot are kept.
fn pdf_base_name(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use docrules_core::{InMemoryContentRepository, InMemorySession, PropertyValue, WorkspaceName};

    use super::*;
    use crate::services::ServiceError;

    #[derive(Default)]
    struct FakeConverter {
        disabled: bool,
        produce_nothing: bool,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl DocumentConverter for FakeConverter {
        fn is_enabled(&self) -> bool {
            !self.disabled
        }

        fn convert(&self, content: &[u8], from: &str, to: &str) -> Result<Option<Vec<u8>>, ServiceError> {
            self.calls.lock().unwrap().push((from.to_string(), to.to_string()));
            if self.produce_nothing {
                return Ok(None);
            }
            let mut out = b"%PDF ".to_vec();
            out.extend_from_slice(content);
            Ok(Some(out))
        }
    }

    struct Fixture {
        session: InMemorySession,
        folder: DocumentId,
        document: DocumentId,
    }

    fn fixture(name: &str, mime: &str) -> Fixture {
        let repo = InMemoryContentRepository::new();
        let session = repo.session(&WorkspaceName::new("default")).unwrap();
        let root = session.root().unwrap();
        let folder = session.add_node(root.id, "docs", NodeKind::Folder).unwrap();
        let document = session
            .add_node(folder.id, name, NodeKind::file(mime, b"body".to_vec()))
            .unwrap();
        Fixture {
            session,
            folder: folder.id,
            document: document.id,
        }
    }

    const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

    #[test]
    fn applies_to_supported_formats_only() {
        let rule = CreatePdfRule::new(Arc::new(FakeConverter::default()));

        let f = fixture("a.docx", DOCX);
        assert!(rule.is_applicable(&DocumentHandle::load(&f.session, f.document).unwrap()));

        let f = fixture("a.png", "image/png");
        assert!(!rule.is_applicable(&DocumentHandle::load(&f.session, f.document).unwrap()));
    }

    #[test]
    fn disabled_converter_or_empty_formats_decline() {
        let f = fixture("a.docx", DOCX);
        let doc = DocumentHandle::load(&f.session, f.document).unwrap();

        let disabled = CreatePdfRule::new(Arc::new(FakeConverter {
            disabled: true,
            ..Default::default()
        }));
        assert!(!disabled.is_applicable(&doc));

        let nothing = CreatePdfRule::new(Arc::new(FakeConverter::default()))
            .with_supported_formats(Vec::<String>::new());
        assert!(!nothing.is_applicable(&doc));
    }

    #[test]
    fn missing_mime_type_declines() {
        let repo = InMemoryContentRepository::new();
        let session = repo.session(&WorkspaceName::new("default")).unwrap();
        let root = session.root().unwrap();
        let node = session
            .add_node(
                root.id,
                "blob",
                NodeKind::File {
                    content_type: None,
                    content: b"?".to_vec(),
                },
            )
            .unwrap();

        let rule = CreatePdfRule::new(Arc::new(FakeConverter::default()));
        assert!(!rule.is_applicable(&DocumentHandle::load(&session, node.id).unwrap()));
    }

    #[test]
    fn pdf_is_stored_next_to_the_document() {
        let f = fixture("report.final.docx", DOCX);
        let converter = Arc::new(FakeConverter::default());
        let rule = CreatePdfRule::new(converter.clone());

        rule.execute(&DocumentHandle::load(&f.session, f.document).unwrap())
            .unwrap();

        let pdf = f.session.child(f.folder, "report.final.pdf").unwrap().unwrap();
        assert_eq!(pdf.content_type(), Some(PDF_MIME_TYPE));
        assert_eq!(pdf.content(), Some(&b"%PDF body"[..]));
        assert_eq!(
            converter.calls.lock().unwrap().as_slice(),
            &[(DOCX.to_string(), PDF_MIME_TYPE.to_string())]
        );
    }

    #[test]
    fn configured_subfolder_is_created_on_demand() {
        let f = fixture("a.docx", DOCX);
        f.session
            .set_property(f.folder, SUBFOLDER_PROPERTY, PropertyValue::string("pdf"))
            .unwrap();
        let rule = CreatePdfRule::new(Arc::new(FakeConverter::default()));

        rule.execute(&DocumentHandle::load(&f.session, f.document).unwrap())
            .unwrap();

        let pdf = f.session.node_by_path("/docs/pdf/a.pdf").unwrap();
        assert!(pdf.content_type() == Some(PDF_MIME_TYPE));
        assert!(f.session.node_by_path("/docs/pdf").unwrap().is_folder());
    }

    #[test]
    fn existing_pdf_is_replaced_by_default() {
        let f = fixture("a.docx", DOCX);
        let old = f
            .session
            .add_node(f.folder, "a.pdf", NodeKind::file(PDF_MIME_TYPE, b"old".to_vec()))
            .unwrap();
        let rule = CreatePdfRule::new(Arc::new(FakeConverter::default()));

        rule.execute(&DocumentHandle::load(&f.session, f.document).unwrap())
            .unwrap();

        let pdf = f.session.child(f.folder, "a.pdf").unwrap().unwrap();
        assert_ne!(pdf.id, old.id);
        assert_eq!(pdf.content(), Some(&b"%PDF body"[..]));
    }

    #[test]
    fn existing_pdf_is_kept_when_not_overwriting() {
        let f = fixture("a.docx", DOCX);
        f.session
            .add_node(f.folder, "a.pdf", NodeKind::file(PDF_MIME_TYPE, b"old".to_vec()))
            .unwrap();
        f.session
            .add_node(f.folder, "a-1.pdf", NodeKind::file(PDF_MIME_TYPE, b"old".to_vec()))
            .unwrap();
        let rule = CreatePdfRule::new(Arc::new(FakeConverter::default()))
            .with_overwrite_if_exists(false);

        rule.execute(&DocumentHandle::load(&f.session, f.document).unwrap())
            .unwrap();

        let kept = f.session.child(f.folder, "a.pdf").unwrap().unwrap();
        assert_eq!(kept.content(), Some(&b"old"[..]));
        assert!(f.session.child(f.folder, "a-2.pdf").unwrap().is_some());
    }

    #[test]
    fn no_converter_output_writes_nothing() {
        let f = fixture("a.docx", DOCX);
        let rule = CreatePdfRule::new(Arc::new(FakeConverter {
            produce_nothing: true,
            ..Default::default()
        }));

        rule.execute(&DocumentHandle::load(&f.session, f.document).unwrap())
            .unwrap();

        assert_eq!(f.session.children(f.folder).unwrap().len(), 1);
    }

    #[test]
    fn base_name_strips_the_last_extension() {
        assert_eq!(pdf_base_name("a.b.docx"), "a.b");
        assert_eq!(pdf_base_name("README"), "README");
    }
}
