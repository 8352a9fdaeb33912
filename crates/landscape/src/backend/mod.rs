//! Backend trait and implementations for talking to Landscape.
//!
//! This module provides the [`Backend`] trait, the blocking
//! [`http::HttpBackend`] used against a real server, and [`MockBackend`],
//! an in-memory stand-in that behaves like the service closely enough to run
//! full create/read/update/delete cycles in tests.
//!
//! # Testing
//!
//! ```
//! use landscape::backend::{Backend, MockBackend};
//! use landscape::{ApiResponse, CallContext, LegacyAction, Params};
//!
//! let mock = MockBackend::new();
//! let ctx = CallContext::background();
//! let params = Params::new()
//!     .with("title", "hello")
//!     .with("code", "ZWNobyBoaQ==")
//!     .with("script_type", "V1");
//!
//! let created = mock
//!     .invoke_legacy_action(&ctx, LegacyAction::CreateScript, &params)
//!     .unwrap();
//! assert!(matches!(created, ApiResponse::Ok(_)));
//! assert_eq!(mock.calls_to("CreateScript").len(), 1);
//! ```

pub mod http;

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::types::{ApiResponse, CallContext, LegacyAction, Params};

/// Operation name recorded for [`Backend::get_script`].
pub const OP_GET_SCRIPT: &str = "GetScript";
/// Operation name recorded for [`Backend::get_script_attachment`].
pub const OP_GET_SCRIPT_ATTACHMENT: &str = "GetScriptAttachment";
/// Operation name recorded for [`Backend::archive_script`].
pub const OP_ARCHIVE_SCRIPT: &str = "ArchiveScript";

/// The remote calls the script core depends on.
///
/// Every method takes the caller's [`CallContext`]. `Err` means no usable
/// response was obtained; documented status codes come back as
/// [`ApiResponse`] arms.
pub trait Backend: Send + Sync {
    /// Fetch a script by id. The payload is left untyped.
    fn get_script(&self, ctx: &CallContext, id: i64) -> Result<ApiResponse<Value>>;

    /// Invoke a named legacy action with flat parameters.
    fn invoke_legacy_action(
        &self,
        ctx: &CallContext,
        action: LegacyAction,
        params: &Params,
    ) -> Result<ApiResponse<Value>>;

    /// Fetch the raw content of a modern script attachment.
    fn get_script_attachment(
        &self,
        ctx: &CallContext,
        script_id: i64,
        attachment_id: i64,
    ) -> Result<ApiResponse<String>>;

    /// Move a modern script to the archived status.
    fn archive_script(&self, ctx: &CallContext, id: i64) -> Result<ApiResponse<Value>>;
}

/// A call observed by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedCall {
    /// Legacy action name, or one of the `OP_*` constants.
    pub operation: String,
    /// Flat parameters of the call.
    pub params: Params,
}

/// Creator reported by the mock for every script it creates.
const MOCK_USER_ID: i64 = 1;
const MOCK_USER_NAME: &str = "Mock Admin";
const MOCK_USER_EMAIL: &str = "admin@example.com";
/// Timestamp reported by the mock for creation and edits.
const MOCK_TIMESTAMP: &str = "2024-01-15T12:00:00Z";
/// Separator between filename and encoded content in the `file` parameter.
const FILE_SEPARATOR: &str = "$$";

#[derive(Debug, Default)]
struct MockState {
    scripts: BTreeMap<i64, Value>,
    legacy_code: HashMap<i64, String>,
    attachment_content: HashMap<(i64, i64), String>,
    next_script_id: i64,
    next_attachment_id: i64,
    calls: Vec<RecordedCall>,
    overrides: HashMap<String, VecDeque<ApiResponse<Value>>>,
}

/// In-memory fake of the Landscape script API.
///
/// Scripts are stored as the JSON payloads `GET /scripts/{id}` would return.
/// Every call is recorded with its flat parameters, and canned responses can
/// be queued per operation to simulate server errors.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create an empty mock server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a raw script payload, keyed by its `id` field.
    ///
    /// Returns the id, or `None` when the payload has no integer `id`.
    pub fn insert_script(&self, payload: Value) -> Option<i64> {
        let id = payload.get("id").and_then(Value::as_i64)?;
        let mut state = self.lock();
        state.next_script_id = state.next_script_id.max(id);
        state.scripts.insert(id, payload);
        Some(id)
    }

    /// Set the code `GetScriptCode` returns for a legacy script.
    pub fn set_legacy_code(&self, script_id: i64, code: impl Into<String>) {
        self.lock().legacy_code.insert(script_id, code.into());
    }

    /// Set the content returned for a modern attachment.
    pub fn insert_attachment_content(
        &self,
        script_id: i64,
        attachment_id: i64,
        content: impl Into<String>,
    ) {
        self.lock()
            .attachment_content
            .insert((script_id, attachment_id), content.into());
    }

    /// Current stored payload of a script.
    #[must_use]
    pub fn script(&self, id: i64) -> Option<Value> {
        self.lock().scripts.get(&id).cloned()
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Parameters of every call to one operation, in order.
    #[must_use]
    pub fn calls_to(&self, operation: &str) -> Vec<Params> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .map(|c| c.params.clone())
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Queue a canned response for the next call to `operation`.
    ///
    /// For [`OP_GET_SCRIPT_ATTACHMENT`] a string payload becomes the raw
    /// body; other payloads are rendered as JSON text.
    pub fn respond_with(&self, operation: impl Into<String>, response: ApiResponse<Value>) {
        self.lock()
            .overrides
            .entry(operation.into())
            .or_default()
            .push_back(response);
    }
}

impl MockState {
    fn record(&mut self, operation: &str, params: Params) -> Option<ApiResponse<Value>> {
        self.calls.push(RecordedCall {
            operation: operation.to_string(),
            params,
        });
        self.overrides
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
    }

    fn handle(&mut self, action: LegacyAction, params: &Params) -> ApiResponse<Value> {
        let outcome = match action {
            LegacyAction::CreateScript => self.create_script(params),
            LegacyAction::EditScript => self.edit_script(params),
            LegacyAction::RemoveScript => self.remove_script(params),
            LegacyAction::GetScriptCode => self.script_code(params),
            LegacyAction::CreateScriptAttachment => self.create_attachment(params),
            LegacyAction::RemoveScriptAttachment => self.remove_attachment(params),
        };
        outcome.map_or_else(|response| response, ApiResponse::Ok)
    }

    fn existing(&mut self, id: i64) -> MockResult<&mut Map<String, Value>> {
        self.scripts
            .get_mut(&id)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| not_found(format!("Unknown script with ID {id}")))
    }

    fn create_script(&mut self, params: &Params) -> MockResult<Value> {
        let title = required(params, "title")?;
        let code = decode_b64(required(params, "code")?)?;
        let script_type = params.get("script_type").unwrap_or("V1").to_ascii_uppercase();
        let time_limit = optional_int(params, "time_limit")?;
        let access_group = params.get("access_group").unwrap_or("global");

        self.next_script_id += 1;
        let id = self.next_script_id;

        let mut payload = match script_type.as_str() {
            "V1" => {
                self.legacy_code.insert(id, code);
                json!({
                    "id": id,
                    "title": title,
                    "access_group": access_group,
                    "creator": {
                        "id": MOCK_USER_ID,
                        "name": MOCK_USER_NAME,
                        "email": MOCK_USER_EMAIL,
                    },
                    "status": "V1",
                    "attachments": [],
                })
            }
            "V2" => {
                let (interpreter, body) = split_shebang(&code)
                    .ok_or_else(|| bad_request("V2 scripts must start with an interpreter line"))?;
                json!({
                    "id": id,
                    "title": title,
                    "access_group": access_group,
                    "status": "ACTIVE",
                    "version_number": 1,
                    "created_at": MOCK_TIMESTAMP,
                    "last_edited_at": MOCK_TIMESTAMP,
                    "created_by": { "id": MOCK_USER_ID, "name": MOCK_USER_NAME },
                    "last_edited_by": { "id": MOCK_USER_ID, "name": MOCK_USER_NAME },
                    "is_editable": true,
                    "is_executable": true,
                    "is_redactable": true,
                    "interpreter": interpreter,
                    "code": body,
                    "attachments": [],
                    "script_profiles": [],
                })
            }
            other => {
                self.next_script_id -= 1;
                return Err(bad_request(format!("Unknown script type {other}")));
            }
        };

        if let Some(fields) = payload.as_object_mut() {
            if let Some(username) = params.get("username") {
                fields.insert("username".into(), json!(username));
            }
            if let Some(limit) = time_limit {
                fields.insert("time_limit".into(), json!(limit));
            }
        }

        self.scripts.insert(id, payload.clone());
        Ok(payload)
    }

    fn edit_script(&mut self, params: &Params) -> MockResult<Value> {
        let id = required_int(params, "script_id")?;
        let time_limit = optional_int(params, "time_limit")?;
        let code = params.get("code").map(decode_b64).transpose()?;

        let fields = self.existing(id)?;
        let legacy = is_legacy(fields);
        if fields.get("status").and_then(Value::as_str) == Some("ARCHIVED") {
            return Err(bad_request("Archived scripts cannot be edited"));
        }

        for key in ["title", "username", "access_group"] {
            if let Some(value) = params.get(key) {
                fields.insert(key.into(), json!(value));
            }
        }
        if let Some(limit) = time_limit {
            fields.insert("time_limit".into(), json!(limit));
        }

        if !legacy {
            if let Some(code) = &code {
                match split_shebang(code) {
                    Some((interpreter, body)) => {
                        fields.insert("interpreter".into(), json!(interpreter));
                        fields.insert("code".into(), json!(body));
                    }
                    None => {
                        fields.insert("code".into(), json!(code));
                    }
                }
            }
            let version = fields
                .get("version_number")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            fields.insert("version_number".into(), json!(version + 1));
            fields.insert("last_edited_at".into(), json!(MOCK_TIMESTAMP));
        }

        let payload = Value::Object(fields.clone());
        if legacy && let Some(code) = code {
            self.legacy_code.insert(id, code);
        }
        Ok(payload)
    }

    fn remove_script(&mut self, params: &Params) -> MockResult<Value> {
        let id = required_int(params, "script_id")?;
        if !is_legacy(self.existing(id)?) {
            return Err(bad_request("V2 scripts cannot be removed, archive them instead"));
        }
        self.scripts.remove(&id);
        self.legacy_code.remove(&id);
        Ok(Value::Null)
    }

    fn script_code(&mut self, params: &Params) -> MockResult<Value> {
        let id = required_int(params, "script_id")?;
        if !is_legacy(self.existing(id)?) {
            return Err(bad_request("GetScriptCode only supports V1 scripts"));
        }
        Ok(json!(self.legacy_code.get(&id).cloned().unwrap_or_default()))
    }

    fn create_attachment(&mut self, params: &Params) -> MockResult<Value> {
        let id = required_int(params, "script_id")?;
        let file = required(params, "file")?;
        let (filename, encoded) = file
            .split_once(FILE_SEPARATOR)
            .ok_or_else(|| bad_request("file must be <filename>$$<base64 content>"))?;
        let content = decode_b64(encoded)?;

        self.next_attachment_id += 1;
        let attachment_id = self.next_attachment_id;

        let fields = self.existing(id)?;
        let legacy = is_legacy(fields);
        let list = fields
            .entry("attachments")
            .or_insert_with(|| json!([]))
            .as_array_mut()
            .ok_or_else(|| bad_request("attachments is not a list"))?;

        let taken = list.iter().any(|entry| attachment_filename(entry) == Some(filename));
        if taken {
            return Err(bad_request(format!("Attachment {filename} already exists")));
        }

        if legacy {
            list.push(json!(filename));
        } else {
            list.push(json!({ "id": attachment_id, "filename": filename }));
            self.attachment_content.insert((id, attachment_id), content);
        }
        Ok(json!(filename))
    }

    fn remove_attachment(&mut self, params: &Params) -> MockResult<Value> {
        let id = required_int(params, "script_id")?;
        let attachment_id = optional_int(params, "attachment_id")?;
        let filename = params.get("filename");

        let fields = self.existing(id)?;
        let list = fields
            .get_mut("attachments")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| not_found("Script has no attachments"))?;

        let position = list.iter().position(|entry| {
            let id_match = attachment_id.is_some()
                && entry.get("id").and_then(Value::as_i64) == attachment_id;
            let name_match = filename.is_some() && attachment_filename(entry) == filename;
            id_match || name_match
        });
        let removed = position
            .map(|index| list.remove(index))
            .ok_or_else(|| not_found("Attachment not found"))?;

        if let Some(aid) = removed.get("id").and_then(Value::as_i64) {
            self.attachment_content.remove(&(id, aid));
        }
        Ok(Value::Null)
    }

    fn archive(&mut self, id: i64) -> MockResult<Value> {
        let fields = self.existing(id)?;
        if is_legacy(fields) {
            return Err(bad_request("V1 scripts cannot be archived"));
        }
        fields.insert("status".into(), json!("ARCHIVED"));
        Ok(Value::Object(fields.clone()))
    }
}

impl Backend for MockBackend {
    fn get_script(&self, ctx: &CallContext, id: i64) -> Result<ApiResponse<Value>> {
        ctx.check(OP_GET_SCRIPT)?;
        let mut state = self.lock();
        if let Some(canned) = state.record(OP_GET_SCRIPT, Params::new().with("script_id", id)) {
            return Ok(canned);
        }
        Ok(state
            .scripts
            .get(&id)
            .cloned()
            .map_or_else(|| not_found(format!("Unknown script with ID {id}")), ApiResponse::Ok))
    }

    fn invoke_legacy_action(
        &self,
        ctx: &CallContext,
        action: LegacyAction,
        params: &Params,
    ) -> Result<ApiResponse<Value>> {
        ctx.check(action.name())?;
        let mut state = self.lock();
        if let Some(canned) = state.record(action.name(), params.clone()) {
            return Ok(canned);
        }
        Ok(state.handle(action, params))
    }

    fn get_script_attachment(
        &self,
        ctx: &CallContext,
        script_id: i64,
        attachment_id: i64,
    ) -> Result<ApiResponse<String>> {
        ctx.check(OP_GET_SCRIPT_ATTACHMENT)?;
        let mut state = self.lock();
        let params = Params::new()
            .with("script_id", script_id)
            .with("attachment_id", attachment_id);
        if let Some(canned) = state.record(OP_GET_SCRIPT_ATTACHMENT, params) {
            return Ok(canned.map(|value| match value {
                Value::String(text) => text,
                other => other.to_string(),
            }));
        }
        if !state.scripts.contains_key(&script_id) {
            return Ok(ApiResponse::NotFound {
                message: Some(format!("Unknown script with ID {script_id}")),
            });
        }
        Ok(state
            .attachment_content
            .get(&(script_id, attachment_id))
            .cloned()
            .map_or_else(
                || ApiResponse::NotFound {
                    message: Some(format!("Unknown attachment with ID {attachment_id}")),
                },
                ApiResponse::Ok,
            ))
    }

    fn archive_script(&self, ctx: &CallContext, id: i64) -> Result<ApiResponse<Value>> {
        ctx.check(OP_ARCHIVE_SCRIPT)?;
        let mut state = self.lock();
        if let Some(canned) = state.record(OP_ARCHIVE_SCRIPT, Params::new().with("script_id", id)) {
            return Ok(canned);
        }
        Ok(state.archive(id).map_or_else(|response| response, ApiResponse::Ok))
    }
}

// ============================================================================
// Mock helpers
// ============================================================================

type MockResult<T> = std::result::Result<T, ApiResponse<Value>>;

fn bad_request(message: impl Into<String>) -> ApiResponse<Value> {
    ApiResponse::BadRequest {
        message: Some(message.into()),
    }
}

fn not_found(message: impl Into<String>) -> ApiResponse<Value> {
    ApiResponse::NotFound {
        message: Some(message.into()),
    }
}

fn required<'a>(params: &'a Params, key: &str) -> MockResult<&'a str> {
    params
        .get(key)
        .ok_or_else(|| bad_request(format!("Missing parameter {key}")))
}

fn required_int(params: &Params, key: &str) -> MockResult<i64> {
    optional_int(params, key)?.ok_or_else(|| bad_request(format!("Missing parameter {key}")))
}

fn optional_int(params: &Params, key: &str) -> MockResult<Option<i64>> {
    params
        .get(key)
        .map(|raw| {
            raw.parse::<i64>()
                .map_err(|_| bad_request(format!("Parameter {key} must be an integer")))
        })
        .transpose()
}

fn decode_b64(encoded: &str) -> MockResult<String> {
    STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| bad_request("Content is not valid base64 text"))
}

fn is_legacy(fields: &Map<String, Value>) -> bool {
    fields.get("status").and_then(Value::as_str) == Some("V1")
}

fn attachment_filename(entry: &Value) -> Option<&str> {
    entry
        .as_str()
        .or_else(|| entry.get("filename").and_then(Value::as_str))
}

/// Split `#!interp\nbody` into `(interp, body)`.
fn split_shebang(code: &str) -> Option<(&str, &str)> {
    let rest = code.strip_prefix("#!")?;
    Some(rest.split_once('\n').unwrap_or((rest, "")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(text: &str) -> String {
        STANDARD.encode(text)
    }

    fn create(mock: &MockBackend, script_type: &str, code: &str) -> Value {
        let params = Params::new()
            .with("title", "demo")
            .with("code", b64(code))
            .with("script_type", script_type);
        mock.invoke_legacy_action(&CallContext::background(), LegacyAction::CreateScript, &params)
            .unwrap()
            .ok()
            .unwrap()
    }

    #[test]
    fn test_mock_create_legacy_script() {
        let mock = MockBackend::new();
        let payload = create(&mock, "v1", "echo hi");

        assert_eq!(payload["status"], "V1");
        assert_eq!(payload["creator"]["email"], MOCK_USER_EMAIL);
        assert!(payload.get("code").is_none());

        let id = payload["id"].as_i64().unwrap();
        let code = mock
            .invoke_legacy_action(
                &CallContext::background(),
                LegacyAction::GetScriptCode,
                &Params::new().with("script_id", id),
            )
            .unwrap();
        assert_eq!(code, ApiResponse::Ok(json!("echo hi")));
    }

    #[test]
    fn test_mock_create_modern_script_splits_interpreter() {
        let mock = MockBackend::new();
        let payload = create(&mock, "V2", "#!/bin/bash\necho hi");

        assert_eq!(payload["status"], "ACTIVE");
        assert_eq!(payload["interpreter"], "/bin/bash");
        assert_eq!(payload["code"], "echo hi");
        assert_eq!(payload["version_number"], 1);
    }

    #[test]
    fn test_mock_modern_script_requires_shebang() {
        let mock = MockBackend::new();
        let params = Params::new()
            .with("title", "demo")
            .with("code", b64("echo hi"))
            .with("script_type", "V2");
        let response = mock
            .invoke_legacy_action(&CallContext::background(), LegacyAction::CreateScript, &params)
            .unwrap();
        assert!(matches!(response, ApiResponse::BadRequest { .. }));
        assert!(mock.script(1).is_none());
    }

    #[test]
    fn test_mock_unknown_script_is_not_found() {
        let mock = MockBackend::new();
        let ctx = CallContext::background();
        let remove = Params::new().with("script_id", 404);

        let removed = mock
            .invoke_legacy_action(&ctx, LegacyAction::RemoveScript, &remove)
            .unwrap();
        assert!(removed.is_not_found());
        assert!(mock.archive_script(&ctx, 404).unwrap().is_not_found());
    }

    #[test]
    fn test_mock_edit_bumps_version() {
        let mock = MockBackend::new();
        let id = create(&mock, "V2", "#!/bin/sh\ntrue")["id"].as_i64().unwrap();

        let params = Params::new().with("script_id", id).with("title", "renamed");
        mock.invoke_legacy_action(&CallContext::background(), LegacyAction::EditScript, &params)
            .unwrap();

        let stored = mock.script(id).unwrap();
        assert_eq!(stored["title"], "renamed");
        assert_eq!(stored["version_number"], 2);
        assert_eq!(stored["code"], "true");
    }

    #[test]
    fn test_mock_archive_and_remove_rules() {
        let mock = MockBackend::new();
        let ctx = CallContext::background();
        let modern = create(&mock, "V2", "#!/bin/sh\ntrue")["id"].as_i64().unwrap();
        let legacy = create(&mock, "V1", "true")["id"].as_i64().unwrap();

        let archived = mock.archive_script(&ctx, modern).unwrap().ok().unwrap();
        assert_eq!(archived["status"], "ARCHIVED");
        assert!(matches!(
            mock.archive_script(&ctx, legacy).unwrap(),
            ApiResponse::BadRequest { .. }
        ));

        let remove = Params::new().with("script_id", legacy);
        mock.invoke_legacy_action(&ctx, LegacyAction::RemoveScript, &remove)
            .unwrap();
        assert!(mock.get_script(&ctx, legacy).unwrap().is_not_found());
    }

    #[test]
    fn test_mock_attachments_per_variant() {
        let mock = MockBackend::new();
        let ctx = CallContext::background();
        let modern = create(&mock, "V2", "#!/bin/sh\ntrue")["id"].as_i64().unwrap();
        let legacy = create(&mock, "V1", "true")["id"].as_i64().unwrap();

        for id in [modern, legacy] {
            let params = Params::new()
                .with("script_id", id)
                .with("file", format!("notes.txt$${}", b64("hello")));
            mock.invoke_legacy_action(&ctx, LegacyAction::CreateScriptAttachment, &params)
                .unwrap();
        }

        let modern_payload = mock.script(modern).unwrap();
        let attachment_id = modern_payload["attachments"][0]["id"].as_i64().unwrap();
        assert_eq!(modern_payload["attachments"][0]["filename"], "notes.txt");
        assert_eq!(
            mock.get_script_attachment(&ctx, modern, attachment_id).unwrap(),
            ApiResponse::Ok("hello".to_string())
        );

        assert_eq!(mock.script(legacy).unwrap()["attachments"], json!(["notes.txt"]));
    }

    #[test]
    fn test_mock_records_calls_and_canned_responses() {
        let mock = MockBackend::new();
        let ctx = CallContext::background();
        mock.respond_with(
            OP_GET_SCRIPT,
            ApiResponse::Unexpected {
                status: 503,
                body: "maintenance".into(),
            },
        );

        let first = mock.get_script(&ctx, 9).unwrap();
        assert!(matches!(first, ApiResponse::Unexpected { status: 503, .. }));
        let second = mock.get_script(&ctx, 9).unwrap();
        assert!(second.is_not_found());

        let calls = mock.calls_to(OP_GET_SCRIPT);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].get("script_id"), Some("9"));

        mock.clear_calls();
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_mock_honours_expired_context() {
        let mock = MockBackend::new();
        let ctx = CallContext::with_deadline(std::time::Instant::now());
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(mock.get_script(&ctx, 1).is_err());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_insert_script_advances_ids() {
        let mock = MockBackend::new();
        assert_eq!(mock.insert_script(json!({"id": 40, "status": "V1"})), Some(40));
        assert_eq!(mock.insert_script(json!({"title": "no id"})), None);

        let next = create(&mock, "V1", "true");
        assert_eq!(next["id"], 41);
    }
}
