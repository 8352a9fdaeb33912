//! Local plan and state records for every resource and data source kind.
//!
//! Every field is an [`Attr`], so a record always says whether a value is
//! known, explicitly absent, or still to be computed. List-typed computed
//! attributes are plain `Vec`s and are never null.

use serde::{Deserialize, Serialize};

use crate::params::ScriptChanges;
use crate::value::Attr;
use crate::variant::{Person, Profile, Variant};

/// Desired inputs of a script resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptPlan {
    /// Title (required on create).
    pub title: Attr<String>,
    /// Full code text (required on create).
    pub code: Attr<String>,
    /// User the script runs as.
    pub username: Attr<String>,
    /// Time limit in seconds.
    pub time_limit: Attr<i64>,
    /// Access group.
    pub access_group: Attr<String>,
    /// `V1` or `V2`, fixed at create.
    pub script_type: Attr<String>,
}

impl ScriptPlan {
    /// Fields whose planned value is known and differs from `prior`.
    pub fn changes_from(&self, prior: &ScriptPlan) -> ScriptChanges {
        ScriptChanges {
            title: self.title.changed_from(&prior.title).cloned(),
            code: self.code.changed_from(&prior.code).cloned(),
            username: self.username.changed_from(&prior.username).cloned(),
            time_limit: self.time_limit.changed_from(&prior.time_limit).copied(),
            access_group: self.access_group.changed_from(&prior.access_group).cloned(),
        }
    }

    /// Planned generation, if a valid selector is set.
    pub fn variant(&self) -> Option<Variant> {
        self.script_type.known().and_then(|s| Variant::from_selector(s))
    }
}

/// Creator of a script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatorRecord {
    /// User id.
    pub id: Attr<i64>,
    /// Display name.
    pub name: Attr<String>,
    /// Email, legacy scripts only.
    pub email: Attr<String>,
}

impl From<&Person> for CreatorRecord {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id.into(),
            name: person.name.clone().into(),
            email: person.email.clone().into(),
        }
    }
}

/// Last editor of a modern script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorRecord {
    /// User id.
    pub id: Attr<i64>,
    /// Display name.
    pub name: Attr<String>,
}

impl From<&Person> for EditorRecord {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id.into(),
            name: person.name.clone().into(),
        }
    }
}

/// An attachment listed on a script. Legacy entries have a null id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentItem {
    /// Attachment id.
    #[serde(default)]
    pub id: Attr<i64>,
    /// Filename.
    pub filename: String,
}

/// A script profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileItem {
    /// Profile id.
    pub id: i64,
    /// Profile title.
    pub title: String,
}

impl From<&Profile> for ProfileItem {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            title: profile.title.clone(),
        }
    }
}

/// State of the unified `script` and the modern `script_v2` kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptRecord {
    pub id: Attr<i64>,
    pub title: Attr<String>,
    pub access_group: Attr<String>,
    pub script_type: Attr<String>,
    pub code: Attr<String>,
    pub created_at: Attr<String>,
    pub created_by: Attr<CreatorRecord>,
    pub last_edited_at: Attr<String>,
    pub status: Attr<String>,
    pub version_number: Attr<i64>,
    pub username: Attr<String>,
    pub time_limit: Attr<i64>,
    pub is_editable: Attr<bool>,
    pub is_executable: Attr<bool>,
    pub is_redactable: Attr<bool>,
    pub last_edited_by: Attr<EditorRecord>,
    pub attachments: Vec<AttachmentItem>,
    pub script_profiles: Attr<Vec<ProfileItem>>,
}

/// State of the legacy-only `script_v1` kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyScriptRecord {
    pub id: Attr<i64>,
    pub title: Attr<String>,
    pub access_group: Attr<String>,
    pub code: Attr<String>,
    pub created_by: Attr<CreatorRecord>,
    pub status: Attr<String>,
    pub username: Attr<String>,
    pub time_limit: Attr<i64>,
    pub attachments: Vec<String>,
}

/// Desired inputs of a `script_attachment` resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentPlan {
    /// Owning script.
    pub script_id: Attr<i64>,
    /// Filename.
    pub filename: Attr<String>,
    /// Text content.
    pub content: Attr<String>,
}

/// State of a `script_attachment` resource or data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentRecord {
    /// Attachment id, null for legacy scripts.
    pub id: Attr<i64>,
    /// Owning script.
    pub script_id: Attr<i64>,
    /// Filename.
    pub filename: Attr<String>,
    /// Text content.
    pub content: Attr<String>,
}

impl AttachmentRecord {
    /// Inputs of this record, as a plan.
    pub fn inputs(&self) -> AttachmentPlan {
        AttachmentPlan {
            script_id: self.script_id.clone(),
            filename: self.filename.clone(),
            content: self.content.clone(),
        }
    }
}
