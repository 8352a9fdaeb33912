//! The two script generations and the decoder that tells them apart.
//!
//! A payload is decoded into exactly one of [`LegacyScript`] or
//! [`ModernScript`]. The `status` field discriminates: legacy scripts always
//! carry the `V1` sentinel, modern ones one of active/archived/redacted. A
//! payload that fits neither shape is an error, never an empty record.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attachments::Attachments;
use crate::error::{Error, Result};

/// Status sentinel carried by every legacy script.
pub const LEGACY_STATUS: &str = "V1";

/// Script generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Flat record, code fetched separately, deletable.
    Legacy,
    /// Versioned record, inline code, archivable.
    Modern,
}

impl Variant {
    /// Parse a `script_type` selector (`V1`/`V2`, any case).
    pub fn from_selector(selector: &str) -> Option<Self> {
        match selector.trim().to_ascii_uppercase().as_str() {
            "V1" => Some(Self::Legacy),
            "V2" => Some(Self::Modern),
            _ => None,
        }
    }

    /// Selector value sent on create.
    #[must_use]
    pub fn selector(&self) -> &'static str {
        match self {
            Self::Legacy => "V1",
            Self::Modern => "V2",
        }
    }

    /// Lowercase label for messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Modern => "modern",
        }
    }

    /// The other generation.
    #[must_use]
    pub fn other(&self) -> Self {
        match self {
            Self::Legacy => Self::Modern,
            Self::Modern => Self::Legacy,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status of a modern script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModernStatus {
    /// Usable.
    #[serde(alias = "active")]
    Active,
    /// Soft-deleted.
    #[serde(alias = "archived")]
    Archived,
    /// Content withheld.
    #[serde(alias = "redacted")]
    Redacted,
}

impl ModernStatus {
    /// Lowercase form stored in state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Redacted => "redacted",
        }
    }
}

/// A user reference. Every sub-field may be missing from the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// User id.
    #[serde(default)]
    pub id: Option<i64>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Email, legacy creators only.
    #[serde(default)]
    pub email: Option<String>,
}

/// A script profile attached to a modern script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile id.
    pub id: i64,
    /// Profile title.
    pub title: String,
}

/// A decoded legacy script. Code is not part of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyScript {
    /// Script id.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Access group.
    pub access_group: Option<String>,
    /// User the script runs as.
    pub username: Option<String>,
    /// Time limit in seconds.
    pub time_limit: Option<i64>,
    /// Creator, with email.
    pub creator: Option<Person>,
    /// Attachments (filenames).
    pub attachments: Attachments,
}

/// A decoded modern script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModernScript {
    /// Script id.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Access group.
    pub access_group: Option<String>,
    /// User the script runs as.
    pub username: Option<String>,
    /// Time limit in seconds.
    pub time_limit: Option<i64>,
    /// Lifecycle status.
    pub status: ModernStatus,
    /// Monotonic version number.
    pub version_number: Option<i64>,
    /// Creation timestamp.
    pub created_at: Option<String>,
    /// Last edit timestamp.
    pub last_edited_at: Option<String>,
    /// Creator, without email.
    pub created_by: Option<Person>,
    /// Last editor.
    pub last_edited_by: Option<Person>,
    /// Capability flags.
    pub is_editable: Option<bool>,
    /// Capability flags.
    pub is_executable: Option<bool>,
    /// Capability flags.
    pub is_redactable: Option<bool>,
    /// Interpreter, without the `#!` prefix as a rule.
    pub interpreter: Option<String>,
    /// Code body.
    pub code: Option<String>,
    /// Attachments (`{id, filename}`).
    pub attachments: Attachments,
    /// Profiles the script belongs to.
    pub script_profiles: Option<Vec<Profile>>,
}

/// A script of either generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// Legacy generation.
    Legacy(LegacyScript),
    /// Modern generation.
    Modern(ModernScript),
}

impl Script {
    /// Script id.
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::Legacy(s) => s.id,
            Self::Modern(s) => s.id,
        }
    }

    /// Generation.
    #[must_use]
    pub fn variant(&self) -> Variant {
        match self {
            Self::Legacy(_) => Variant::Legacy,
            Self::Modern(_) => Variant::Modern,
        }
    }

    /// Attachments.
    #[must_use]
    pub fn attachments(&self) -> &Attachments {
        match self {
            Self::Legacy(s) => &s.attachments,
            Self::Modern(s) => &s.attachments,
        }
    }

    /// Whether the script is a modern script in the archived state.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        matches!(self, Self::Modern(s) if s.status == ModernStatus::Archived)
    }
}

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Deserialize)]
enum LegacyStatus {
    #[serde(rename = "V1")]
    V1,
}

#[derive(Debug, Deserialize)]
struct LegacyWire {
    id: i64,
    title: String,
    #[serde(default)]
    access_group: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    time_limit: Option<i64>,
    #[serde(default)]
    creator: Option<Person>,
    #[allow(dead_code)]
    status: LegacyStatus,
    #[serde(default)]
    attachments: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ModernWire {
    id: i64,
    title: String,
    #[serde(default)]
    access_group: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    time_limit: Option<i64>,
    status: ModernStatus,
    #[serde(default)]
    version_number: Option<i64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    last_edited_at: Option<String>,
    #[serde(default)]
    created_by: Option<Person>,
    #[serde(default)]
    last_edited_by: Option<Person>,
    #[serde(default)]
    is_editable: Option<bool>,
    #[serde(default)]
    is_executable: Option<bool>,
    #[serde(default)]
    is_redactable: Option<bool>,
    #[serde(default)]
    interpreter: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    attachments: Option<Value>,
    #[serde(default)]
    script_profiles: Option<Value>,
}

/// Project attachments, rejecting the shape of the other generation.
fn project_attachments(raw: Option<&Value>, variant: Variant) -> Result<Attachments> {
    let attachments = Attachments::project(raw)?;
    let reason = match (&attachments, variant) {
        (Attachments::Objects(_), Variant::Legacy) => "legacy scripts list bare filenames",
        (Attachments::Filenames(_), Variant::Modern) => "modern scripts list {id, filename} objects",
        _ => return Ok(attachments),
    };
    Err(Error::Malformed {
        what: "attachments",
        reason: reason.to_string(),
    })
}

impl LegacyWire {
    fn into_script(self) -> Result<LegacyScript> {
        Ok(LegacyScript {
            id: self.id,
            title: self.title,
            access_group: self.access_group,
            username: self.username,
            time_limit: self.time_limit,
            creator: self.creator,
            attachments: project_attachments(self.attachments.as_ref(), Variant::Legacy)?,
        })
    }
}

impl ModernWire {
    fn into_script(self) -> Result<ModernScript> {
        let script_profiles = match self.script_profiles {
            None | Some(Value::Null) => None,
            Some(raw) => Some(Vec::<Profile>::deserialize(&raw).map_err(|e| Error::Malformed {
                what: "script_profiles",
                reason: e.to_string(),
            })?),
        };

        // Emails are only reported for legacy creators.
        let strip_email = |person: Option<Person>| {
            person.map(|p| Person { email: None, ..p })
        };

        Ok(ModernScript {
            id: self.id,
            title: self.title,
            access_group: self.access_group,
            username: self.username,
            time_limit: self.time_limit,
            status: self.status,
            version_number: self.version_number,
            created_at: self.created_at,
            last_edited_at: self.last_edited_at,
            created_by: strip_email(self.created_by),
            last_edited_by: strip_email(self.last_edited_by),
            is_editable: self.is_editable,
            is_executable: self.is_executable,
            is_redactable: self.is_redactable,
            interpreter: self.interpreter,
            code: self.code,
            attachments: project_attachments(self.attachments.as_ref(), Variant::Modern)?,
            script_profiles,
        })
    }
}

/// Decode a raw payload into one script generation.
///
/// `hint` only orders the attempts: the hinted generation is tried first,
/// and without a hint modern is tried first. The discriminator makes the two
/// shapes exclusive, so the order never changes the result for well-formed
/// input.
pub fn decode(raw: &Value, hint: Option<Variant>) -> Result<Script> {
    let first = hint.unwrap_or(Variant::Modern);
    let mut failures = Vec::with_capacity(2);

    for variant in [first, first.other()] {
        let attempt = match variant {
            Variant::Legacy => LegacyWire::deserialize(raw).map(|wire| wire.into_script().map(Script::Legacy)),
            Variant::Modern => ModernWire::deserialize(raw).map(|wire| wire.into_script().map(Script::Modern)),
        };
        match attempt {
            Ok(script) => {
                if hint.is_some_and(|h| h != variant) {
                    log::warn!("payload decoded as {variant}, expected {}", first);
                } else {
                    log::debug!("payload decoded as {variant}");
                }
                return script;
            }
            Err(err) => failures.push(format!("not {variant}: {err}")),
        }
    }

    Err(Error::UnrecognizedShape(failures.join("; ")))
}
