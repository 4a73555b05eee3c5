//! MIME type groups (`word`, `excel`, `pdf`, ...).

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One MIME pattern. `*` matches any run of characters, everything else is
/// literal, and the whole string must match.
///
/// The regex behind a wildcard pattern is compiled on first use and kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MimePattern {
    source: String,
    compiled: OnceLock<Option<Regex>>,
}

impl MimePattern {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiled: OnceLock::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, mime_type: &str) -> bool {
        if !self.source.contains('*') {
            return self.source == mime_type;
        }

        self.compiled
            .get_or_init(|| {
                let translated = regex::escape(&self.source).replace(r"\*", ".*");
                Regex::new(&format!("^{translated}$")).ok()
            })
            .as_ref()
            .is_some_and(|re| re.is_match(mime_type))
    }
}

impl PartialEq for MimePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for MimePattern {}

impl From<String> for MimePattern {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<&str> for MimePattern {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<MimePattern> for String {
    fn from(pattern: MimePattern) -> Self {
        pattern.source
    }
}

/// Named groups of MIME patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MimeGroups {
    groups: BTreeMap<String, Vec<MimePattern>>,
}

impl Default for MimeGroups {
    fn default() -> Self {
        Self::empty()
            .with_group("pdf", ["application/pdf"])
            .with_group(
                "word",
                [
                    "application/msword",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.*",
                ],
            )
            .with_group("rtf", ["application/rtf", "text/rtf"])
            .with_group(
                "excel",
                [
                    "application/vnd.ms-excel",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.*",
                ],
            )
            .with_group(
                "powerpoint",
                [
                    "application/vnd.ms-powerpoint",
                    "application/vnd.openxmlformats-officedocument.presentationml.*",
                ],
            )
            .with_group("openoffice", ["application/vnd.oasis.opendocument.*"])
            .with_group("text", ["text/plain"])
            .with_group("image", ["image/*"])
    }
}

impl MimeGroups {
    pub fn empty() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }

    /// Add (or replace) a group.
    pub fn with_group<I, P>(mut self, name: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<MimePattern>,
    {
        self.groups
            .insert(name.into(), patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn patterns(&self, group: &str) -> Option<&[MimePattern]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// Does `mime_type` belong to one of `groups`?
    ///
    /// An entry of `groups` containing `/` is used as a pattern itself;
    /// anything else is a group name. Unknown group names match nothing.
    pub fn matches<S: AsRef<str>>(&self, mime_type: Option<&str>, groups: &[S]) -> bool {
        let Some(mime_type) = mime_type else {
            return false;
        };

        groups.iter().any(|group| {
            let group = group.as_ref();
            if group.contains('/') {
                MimePattern::new(group).matches(mime_type)
            } else {
                self.patterns(group)
                    .is_some_and(|patterns| patterns.iter().any(|p| p.matches(mime_type)))
            }
        })
    }
}
