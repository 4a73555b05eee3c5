//! Bundled document rules and the backend-service contracts they rely on.
//!
//! - [`CreatePdfRule`] (`createPDF`): converts office documents to PDF next
//!   to the original (or into a configured subfolder)
//! - [`EmailRule`] (`emailNotification`): notifies the members of a group
//! - [`TaggingRule`] (`tagging`): tags the document with folder-configured tags
//!
//! Backends (conversion, mail, groups, tagging, templates) are injected
//! through the traits in [`services`].

pub mod create_pdf;
pub mod email;
pub mod mime;
pub mod services;
pub mod tagging;
pub mod template;

pub use create_pdf::CreatePdfRule;
pub use email::EmailRule;
pub use mime::{MimeGroups, MimePattern};
pub use services::{
    DocumentConverter, Group, GroupDirectory, MailService, Principal, ServiceError,
    TaggingService, TemplateEvaluator, User,
};
pub use tagging::{PropertyTaggingService, TaggingRule};
pub use template::PlaceholderTemplates;
