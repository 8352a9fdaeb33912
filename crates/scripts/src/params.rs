//! Flat parameter encoding for legacy actions.
//!
//! The only place where typed requests become string maps. Code and
//! attachment content are base64 encoded here.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use landscape::Params;

use crate::variant::Variant;

/// Separator between filename and encoded content in the `file` parameter.
pub const FILE_DELIMITER: &str = "$$";

/// Base64-encode text for transport.
pub fn encode_content(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// A script to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScript {
    /// Title.
    pub title: String,
    /// Full code text.
    pub code: String,
    /// Generation to create.
    pub variant: Variant,
    /// User the script runs as.
    pub username: Option<String>,
    /// Time limit in seconds.
    pub time_limit: Option<i64>,
    /// Access group.
    pub access_group: Option<String>,
}

/// Fields to change on an existing script. `None` means leave untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptChanges {
    /// New title.
    pub title: Option<String>,
    /// New code text.
    pub code: Option<String>,
    /// New username.
    pub username: Option<String>,
    /// New time limit.
    pub time_limit: Option<i64>,
    /// New access group.
    pub access_group: Option<String>,
}

impl ScriptChanges {
    /// Whether nothing changes.
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Names of the changed attributes.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.code.is_some() {
            fields.push("code");
        }
        if self.username.is_some() {
            fields.push("username");
        }
        if self.time_limit.is_some() {
            fields.push("time_limit");
        }
        if self.access_group.is_some() {
            fields.push("access_group");
        }
        fields
    }
}

/// `CreateScript` parameters.
pub fn create_script(script: &NewScript) -> Params {
    let mut params = Params::new()
        .with("title", &script.title)
        .with("code", encode_content(&script.code))
        .with("script_type", script.variant.selector());
    if let Some(username) = &script.username {
        params.set("username", username);
    }
    if let Some(limit) = script.time_limit {
        params.set("time_limit", limit);
    }
    if let Some(group) = &script.access_group {
        params.set("access_group", group);
    }
    params
}

/// `EditScript` parameters: the id plus only the changed fields.
pub fn edit_script(script_id: i64, changes: &ScriptChanges) -> Params {
    let mut params = Params::new().with("script_id", script_id);
    if let Some(title) = &changes.title {
        params.set("title", title);
    }
    if let Some(code) = &changes.code {
        params.set("code", encode_content(code));
    }
    if let Some(username) = &changes.username {
        params.set("username", username);
    }
    if let Some(limit) = changes.time_limit {
        params.set("time_limit", limit);
    }
    if let Some(group) = &changes.access_group {
        params.set("access_group", group);
    }
    params
}

/// `RemoveScript` parameters.
pub fn remove_script(script_id: i64) -> Params {
    Params::new().with("script_id", script_id)
}

/// `GetScriptCode` parameters.
pub fn get_script_code(script_id: i64) -> Params {
    Params::new().with("script_id", script_id)
}

/// `CreateScriptAttachment` parameters.
pub fn create_attachment(script_id: i64, filename: &str, content: &str) -> Params {
    Params::new().with("script_id", script_id).with(
        "file",
        format!("{filename}{FILE_DELIMITER}{}", encode_content(content)),
    )
}

/// `RemoveScriptAttachment` parameters, by id and/or filename.
pub fn remove_attachment(script_id: i64, attachment_id: Option<i64>, filename: Option<&str>) -> Params {
    let mut params = Params::new().with("script_id", script_id);
    if let Some(id) = attachment_id {
        params.set("attachment_id", id);
    }
    if let Some(filename) = filename {
        params.set("filename", filename);
    }
    params
}
