//! State projection: decoded scripts into complete local records.

use std::fmt;

use landscape::{ApiResponse, Backend, CallContext};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::attachments::Attachments;
use crate::content::{fetch_legacy_code, merge_code};
use crate::error::{Error, Result, expect_ok};
use crate::record::{
    AttachmentItem, CreatorRecord, EditorRecord, LegacyScriptRecord, ProfileItem, ScriptPlan,
    ScriptRecord,
};
use crate::value::Attr;
use crate::variant::{
    LEGACY_STATUS, LegacyScript, ModernScript, ModernStatus, Person, Script, Variant, decode,
};

/// A decoded script with every secondary fetch done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedScript {
    /// Legacy script and the code fetched for it.
    Legacy {
        /// Decoded payload.
        script: LegacyScript,
        /// Code from the secondary fetch.
        code: String,
    },
    /// Modern script; its code is inline.
    Modern {
        /// Decoded payload.
        script: ModernScript,
    },
}

impl ResolvedScript {
    /// Script id.
    pub fn id(&self) -> i64 {
        match self {
            Self::Legacy { script, .. } => script.id,
            Self::Modern { script } => script.id,
        }
    }

    /// Generation.
    pub fn variant(&self) -> Variant {
        match self {
            Self::Legacy { .. } => Variant::Legacy,
            Self::Modern { .. } => Variant::Modern,
        }
    }

    /// Whether this is an archived modern script.
    pub fn is_archived(&self) -> bool {
        match self {
            Self::Legacy { .. } => false,
            Self::Modern { script } => script.status == ModernStatus::Archived,
        }
    }
}

/// Decode a payload, check it against `policy`, and only then run the
/// secondary code fetch for legacy scripts.
pub fn resolve(
    backend: &dyn Backend,
    ctx: &CallContext,
    raw: &Value,
    hint: Option<Variant>,
    policy: VariantPolicy,
) -> Result<ResolvedScript> {
    let script = decode(raw, hint)?;
    policy.check(script.id(), script.variant())?;
    match script {
        Script::Legacy(script) => {
            let code = fetch_legacy_code(backend, ctx, script.id)?;
            Ok(ResolvedScript::Legacy { script, code })
        }
        Script::Modern(script) => Ok(ResolvedScript::Modern { script }),
    }
}

/// Fetch and resolve a script. `None` if the server reports it missing.
pub fn fetch_script(
    backend: &dyn Backend,
    ctx: &CallContext,
    id: i64,
    hint: Option<Variant>,
    policy: VariantPolicy,
) -> Result<Option<ResolvedScript>> {
    let operation = format!("read script {id}");
    let response = backend
        .get_script(ctx, id)
        .map_err(Error::transport(&operation))?;
    if let ApiResponse::NotFound { .. } = response {
        return Ok(None);
    }
    let raw = expect_ok(response, &operation)?;
    resolve(backend, ctx, &raw, hint, policy).map(Some)
}

/// Which generations a resource or data source kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantPolicy {
    /// Either generation; legacy when creating without a selector.
    Any,
    /// Exactly one generation.
    Only(Variant),
}

impl VariantPolicy {
    /// Generation used on create when the plan has no selector.
    pub fn default_variant(&self) -> Variant {
        match self {
            Self::Any => Variant::Legacy,
            Self::Only(variant) => *variant,
        }
    }

    /// The pinned generation, if any.
    pub fn pinned(&self) -> Option<Variant> {
        match self {
            Self::Any => None,
            Self::Only(variant) => Some(*variant),
        }
    }

    /// Reject a script of a generation this kind does not accept.
    pub fn check(&self, id: i64, actual: Variant) -> Result<()> {
        match self {
            Self::Only(expected) if *expected != actual => Err(Error::VariantMismatch {
                id,
                expected: expected.label(),
                actual: actual.label(),
            }),
            _ => Ok(()),
        }
    }
}

/// A local record a resolved script can be projected into.
pub trait ScriptState:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync
{
    /// Build the complete record.
    fn project(resolved: &ResolvedScript) -> Result<Self>;

    /// Script id, if known.
    fn id(&self) -> Option<i64>;

    /// Generation recorded in this state, used as the decode hint.
    fn variant(&self) -> Option<Variant>;

    /// Input attributes as recorded in this state.
    fn inputs(&self) -> ScriptPlan;

    /// Import seed: only the identity is set.
    fn seed(id: i64, variant: Option<Variant>) -> Self;
}

fn creator(person: Option<&Person>) -> Attr<CreatorRecord> {
    person.map(CreatorRecord::from).into()
}

fn attachment_items(attachments: &Attachments) -> Vec<AttachmentItem> {
    attachments
        .entries()
        .into_iter()
        .map(|entry| AttachmentItem {
            id: entry.id.into(),
            filename: entry.filename,
        })
        .collect()
}

impl ScriptState for ScriptRecord {
    fn project(resolved: &ResolvedScript) -> Result<Self> {
        let record = match resolved {
            ResolvedScript::Legacy { script, code } => Self {
                id: Attr::Known(script.id),
                title: Attr::Known(script.title.clone()),
                access_group: script.access_group.clone().into(),
                script_type: Attr::Known(Variant::Legacy.selector().to_string()),
                code: Attr::Known(code.clone()),
                created_at: Attr::Null,
                created_by: creator(script.creator.as_ref()),
                last_edited_at: Attr::Null,
                status: Attr::Known(LEGACY_STATUS.to_string()),
                version_number: Attr::Null,
                username: script.username.clone().into(),
                time_limit: script.time_limit.into(),
                is_editable: Attr::Null,
                is_executable: Attr::Null,
                is_redactable: Attr::Null,
                last_edited_by: Attr::Null,
                attachments: attachment_items(&script.attachments),
                script_profiles: Attr::Null,
            },
            ResolvedScript::Modern { script } => Self {
                id: Attr::Known(script.id),
                title: Attr::Known(script.title.clone()),
                access_group: script.access_group.clone().into(),
                script_type: Attr::Known(Variant::Modern.selector().to_string()),
                code: merge_code(script.interpreter.as_deref(), script.code.as_deref()).into(),
                created_at: script.created_at.clone().into(),
                created_by: creator(script.created_by.as_ref()),
                last_edited_at: script.last_edited_at.clone().into(),
                status: Attr::Known(script.status.as_str().to_string()),
                version_number: script.version_number.into(),
                username: script.username.clone().into(),
                time_limit: script.time_limit.into(),
                is_editable: script.is_editable.into(),
                is_executable: script.is_executable.into(),
                is_redactable: script.is_redactable.into(),
                last_edited_by: script.last_edited_by.as_ref().map(EditorRecord::from).into(),
                attachments: attachment_items(&script.attachments),
                script_profiles: Attr::Known(
                    script
                        .script_profiles
                        .iter()
                        .flatten()
                        .map(ProfileItem::from)
                        .collect(),
                ),
            },
        };
        Ok(record)
    }

    fn id(&self) -> Option<i64> {
        self.id.known().copied()
    }

    fn variant(&self) -> Option<Variant> {
        match self.status.known() {
            Some(status) if status == LEGACY_STATUS => Some(Variant::Legacy),
            Some(_) => Some(Variant::Modern),
            None => self.script_type.known().and_then(|s| Variant::from_selector(s)),
        }
    }

    fn inputs(&self) -> ScriptPlan {
        ScriptPlan {
            title: self.title.clone(),
            code: self.code.clone(),
            username: self.username.clone(),
            time_limit: self.time_limit.clone(),
            access_group: self.access_group.clone(),
            script_type: self.script_type.clone(),
        }
    }

    fn seed(id: i64, variant: Option<Variant>) -> Self {
        Self {
            id: Attr::Known(id),
            script_type: variant.map(|v| v.selector().to_string()).into(),
            ..Self::default()
        }
    }
}

impl ScriptState for LegacyScriptRecord {
    fn project(resolved: &ResolvedScript) -> Result<Self> {
        match resolved {
            ResolvedScript::Legacy { script, code } => Ok(Self {
                id: Attr::Known(script.id),
                title: Attr::Known(script.title.clone()),
                access_group: script.access_group.clone().into(),
                code: Attr::Known(code.clone()),
                created_by: creator(script.creator.as_ref()),
                status: Attr::Known(LEGACY_STATUS.to_string()),
                username: script.username.clone().into(),
                time_limit: script.time_limit.into(),
                attachments: script.attachments.filenames(),
            }),
            ResolvedScript::Modern { script } => Err(Error::VariantMismatch {
                id: script.id,
                expected: Variant::Legacy.label(),
                actual: Variant::Modern.label(),
            }),
        }
    }

    fn id(&self) -> Option<i64> {
        self.id.known().copied()
    }

    fn variant(&self) -> Option<Variant> {
        Some(Variant::Legacy)
    }

    fn inputs(&self) -> ScriptPlan {
        ScriptPlan {
            title: self.title.clone(),
            code: self.code.clone(),
            username: self.username.clone(),
            time_limit: self.time_limit.clone(),
            access_group: self.access_group.clone(),
            script_type: Attr::Known(Variant::Legacy.selector().to_string()),
        }
    }

    fn seed(id: i64, _variant: Option<Variant>) -> Self {
        Self {
            id: Attr::Known(id),
            ..Self::default()
        }
    }
}
