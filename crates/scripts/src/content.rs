//! Script code and attachment content that does not come with the payload.

use landscape::{Backend, CallContext, LegacyAction};
use serde_json::Value;

use crate::error::{Error, Result, expect_ok};
use crate::params;

/// Fetch the code of a legacy script.
///
/// This is part of every legacy read: the script payload never embeds code.
pub fn fetch_legacy_code(backend: &dyn Backend, ctx: &CallContext, script_id: i64) -> Result<String> {
    let operation = format!("fetch code of script {script_id}");
    let response = backend
        .invoke_legacy_action(ctx, LegacyAction::GetScriptCode, &params::get_script_code(script_id))
        .map_err(Error::transport(&operation))?;

    match expect_ok(response, &operation)? {
        Value::String(code) => Ok(code),
        other => Err(Error::Malformed {
            what: "script code",
            reason: format!("expected a string, got {other}"),
        }),
    }
}

/// Join a modern script's interpreter and body into one text.
///
/// Returns `None` unless both halves are present. An interpreter that
/// already carries `#!` is not prefixed again.
pub fn merge_code(interpreter: Option<&str>, body: Option<&str>) -> Option<String> {
    let (interpreter, body) = (interpreter?, body?);
    if interpreter.starts_with("#!") {
        Some(format!("{interpreter}\n{body}"))
    } else {
        Some(format!("#!{interpreter}\n{body}"))
    }
}

/// Fetch the raw content of a modern attachment.
pub fn fetch_attachment_content(
    backend: &dyn Backend,
    ctx: &CallContext,
    script_id: i64,
    attachment_id: i64,
) -> Result<String> {
    let operation = format!("fetch attachment {attachment_id} of script {script_id}");
    let response = backend
        .get_script_attachment(ctx, script_id, attachment_id)
        .map_err(Error::transport(&operation))?;
    expect_ok(response, &operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use landscape::{ApiResponse, MockBackend};
    use serde_json::json;

    #[test]
    fn test_merge_code_exact_format() {
        assert_eq!(
            merge_code(Some("/bin/bash"), Some("echo hi")).as_deref(),
            Some("#!/bin/bash\necho hi")
        );
        assert_eq!(
            merge_code(Some("#!/usr/bin/env python3"), Some("print(1)")).as_deref(),
            Some("#!/usr/bin/env python3\nprint(1)")
        );
        assert_eq!(merge_code(Some("/bin/sh"), Some("")).as_deref(), Some("#!/bin/sh\n"));
    }

    #[test]
    fn test_merge_code_requires_both_halves() {
        assert_eq!(merge_code(None, Some("echo hi")), None);
        assert_eq!(merge_code(Some("/bin/bash"), None), None);
        assert_eq!(merge_code(None, None), None);
    }

    #[test]
    fn test_fetch_legacy_code() {
        let mock = MockBackend::new();
        mock.insert_script(json!({"id": 4, "title": "t", "status": "V1"}));
        mock.set_legacy_code(4, "echo legacy");

        let code = fetch_legacy_code(&mock, &CallContext::background(), 4).unwrap();
        assert_eq!(code, "echo legacy");
        assert_eq!(mock.calls_to("GetScriptCode")[0].get("script_id"), Some("4"));
    }

    #[test]
    fn test_fetch_legacy_code_rejects_non_string() {
        let mock = MockBackend::new();
        mock.respond_with("GetScriptCode", ApiResponse::Ok(json!({"code": "x"})));
        let err = fetch_legacy_code(&mock, &CallContext::background(), 4).unwrap_err();
        assert!(matches!(err, Error::Malformed { what: "script code", .. }));
    }

    #[test]
    fn test_fetch_attachment_content_not_found() {
        let mock = MockBackend::new();
        mock.insert_script(json!({"id": 4, "title": "t", "status": "ACTIVE"}));
        let err = fetch_attachment_content(&mock, &CallContext::background(), 4, 99).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
