//! Attachment collections as they appear inside script payloads.
//!
//! Legacy scripts list attachments as bare filenames. Modern scripts list
//! `{id, filename}` objects. The collection is projected as a whole: every
//! element must fit the same shape or the payload is rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// An attachment reference with a server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Attachment id.
    pub id: i64,
    /// Filename.
    pub filename: String,
}

/// A canonical attachment entry. Legacy entries have no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentEntry {
    /// Attachment id, modern scripts only.
    pub id: Option<i64>,
    /// Filename.
    pub filename: String,
}

/// A projected attachment collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Attachments {
    /// Absent or empty.
    #[default]
    Empty,
    /// Bare filenames (legacy shape).
    Filenames(Vec<String>),
    /// `{id, filename}` objects (modern shape).
    Objects(Vec<AttachmentRef>),
}

impl Attachments {
    /// Project a raw collection.
    pub fn project(raw: Option<&Value>) -> Result<Self> {
        let items = match raw {
            None | Some(Value::Null) => return Ok(Self::Empty),
            Some(Value::Array(items)) if items.is_empty() => return Ok(Self::Empty),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(Error::MixedAttachments(format!(
                    "expected a list, got {}",
                    kind_of(other)
                )));
            }
        };

        let filenames: Option<Vec<String>> = items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect();
        if let Some(filenames) = filenames {
            return Ok(Self::Filenames(filenames));
        }

        let objects: Option<Vec<AttachmentRef>> = items
            .iter()
            .map(|item| AttachmentRef::deserialize(item).ok())
            .collect();
        if let Some(objects) = objects {
            return Ok(Self::Objects(objects));
        }

        let strings = items.iter().filter(|item| item.is_string()).count();
        Err(Error::MixedAttachments(format!(
            "{} element(s): {} filename(s), {} other; expected all filenames or all {{id, filename}} objects",
            items.len(),
            strings,
            items.len() - strings
        )))
    }

    /// Canonical entries, in server order.
    pub fn entries(&self) -> Vec<AttachmentEntry> {
        match self {
            Self::Empty => Vec::new(),
            Self::Filenames(names) => names
                .iter()
                .map(|filename| AttachmentEntry {
                    id: None,
                    filename: filename.clone(),
                })
                .collect(),
            Self::Objects(refs) => refs
                .iter()
                .map(|r| AttachmentEntry {
                    id: Some(r.id),
                    filename: r.filename.clone(),
                })
                .collect(),
        }
    }

    /// Filenames, in server order.
    pub fn filenames(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.filename).collect()
    }

    /// Find an attachment by filename.
    pub fn find_by_filename(&self, filename: &str) -> Option<AttachmentEntry> {
        self.entries().into_iter().find(|e| e.filename == filename)
    }

    /// Find an attachment by id. Never matches legacy entries.
    pub fn find_by_id(&self, id: i64) -> Option<AttachmentEntry> {
        self.entries().into_iter().find(|e| e.id == Some(id))
    }

    /// Number of attachments.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Filenames(names) => names.len(),
            Self::Objects(refs) => refs.len(),
        }
    }

    /// Whether there are none.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
