//! The `script_attachment` resource.
//!
//! Attachments are immutable once created. Any change means destroy and
//! create again; in-place update fails without calling the server.

use std::sync::Arc;

use landscape::{ApiResponse, Backend, CallContext, LegacyAction};

use crate::content::fetch_attachment_content;
use crate::diagnostics::{Diagnostics, Outcome};
use crate::error::{Error, Result, expect_ok};
use crate::params;
use crate::record::{AttachmentPlan, AttachmentRecord};
use crate::resource::{ChangeKind, ManagedResource};
use crate::value::Attr;
use crate::variant::{Script, decode};

/// A single attachment on a script.
pub struct AttachmentResource {
    backend: Arc<dyn Backend>,
}

impl AttachmentResource {
    /// Create the resource kind.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Look an attachment up by filename and build its record.
    ///
    /// Modern attachments get their content fetched. Legacy attachments have
    /// no id and no way to read content back, so `content` is kept as given.
    fn read_attachment(
        &self,
        ctx: &CallContext,
        script_id: i64,
        filename: &str,
        content: Attr<String>,
    ) -> Result<Option<AttachmentRecord>> {
        let operation = format!("read script {script_id}");
        let response = self
            .backend
            .get_script(ctx, script_id)
            .map_err(Error::transport(&operation))?;
        if response.is_not_found() {
            log::info!("script {script_id} no longer exists, dropping attachment {filename}");
            return Ok(None);
        }
        let script = decode(&expect_ok(response, &operation)?, None)?;
        if script.is_archived() {
            log::info!("script {script_id} is archived, dropping attachment {filename}");
            return Ok(None);
        }

        let Some(entry) = script.attachments().find_by_filename(filename) else {
            log::info!("attachment {filename} no longer exists on script {script_id}");
            return Ok(None);
        };

        let content = match (&script, entry.id) {
            (Script::Modern(_), Some(attachment_id)) => Attr::Known(fetch_attachment_content(
                self.backend.as_ref(),
                ctx,
                script_id,
                attachment_id,
            )?),
            _ => content,
        };

        Ok(Some(AttachmentRecord {
            id: entry.id.into(),
            script_id: Attr::Known(script_id),
            filename: Attr::Known(entry.filename),
            content,
        }))
    }
}

fn identity(record: &AttachmentRecord) -> Result<(i64, &str)> {
    let script_id = record
        .script_id
        .known()
        .copied()
        .ok_or(Error::MissingInput("script_id"))?;
    let filename = record
        .filename
        .known()
        .ok_or(Error::MissingInput("filename"))?;
    Ok((script_id, filename))
}

impl ManagedResource for AttachmentResource {
    type Plan = AttachmentPlan;
    type State = AttachmentRecord;

    fn type_name(&self) -> &'static str {
        "script_attachment"
    }

    fn create(&self, ctx: &CallContext, plan: &AttachmentPlan) -> Outcome<AttachmentRecord> {
        let mut diags = Diagnostics::new();
        let script_id = plan.script_id.known().copied();
        if script_id.is_none() {
            diags.push_error(&Error::MissingInput("script_id"));
        }
        let filename = plan.filename.known();
        if filename.is_none() {
            diags.push_error(&Error::MissingInput("filename"));
        }
        let content = plan.content.known();
        if content.is_none() {
            diags.push_error(&Error::MissingInput("content"));
        }
        let (Some(script_id), Some(filename), Some(content)) = (script_id, filename, content) else {
            return Err(diags);
        };

        let operation = format!("attach {filename} to script {script_id}");
        let response = self
            .backend
            .invoke_legacy_action(
                ctx,
                LegacyAction::CreateScriptAttachment,
                &params::create_attachment(script_id, filename, content),
            )
            .map_err(Error::transport(&operation))?;
        expect_ok(response, &operation)?;

        let record = self
            .read_attachment(ctx, script_id, filename, Attr::Known(content.clone()))?
            .ok_or_else(|| Error::NotFound {
                operation: format!("read back attachment {filename}"),
                message: format!("script {script_id} does not list it"),
            })?;
        Ok(record)
    }

    fn read(&self, ctx: &CallContext, current: &AttachmentRecord) -> Outcome<Option<AttachmentRecord>> {
        let (script_id, filename) = identity(current)?;
        Ok(self.read_attachment(ctx, script_id, filename, current.content.clone())?)
    }

    fn update(
        &self,
        _ctx: &CallContext,
        _plan: &AttachmentPlan,
        _current: &AttachmentRecord,
    ) -> Outcome<AttachmentRecord> {
        Err(Error::Unsupported(
            "script attachments are immutable; destroy and recreate to change them".to_string(),
        )
        .into())
    }

    fn delete(&self, ctx: &CallContext, current: &AttachmentRecord) -> Outcome<()> {
        let (script_id, filename) = identity(current)?;
        let operation = format!("remove attachment {filename} from script {script_id}");
        let response = self
            .backend
            .invoke_legacy_action(
                ctx,
                LegacyAction::RemoveScriptAttachment,
                &params::remove_attachment(script_id, current.id.known().copied(), Some(filename)),
            )
            .map_err(Error::transport(&operation))?;
        if let ApiResponse::NotFound { .. } = response {
            log::info!("{operation}: already gone");
            return Ok(());
        }
        expect_ok(response, &operation)?;
        Ok(())
    }

    fn import_by_id(&self, id: &str) -> Outcome<AttachmentRecord> {
        let invalid = |reason: String| Error::InvalidImportId {
            id: id.to_string(),
            reason,
        };
        let (script_id, filename) = id
            .split_once('/')
            .ok_or_else(|| invalid("expected <script_id>/<filename>".to_string()))?;
        let script_id = script_id
            .trim()
            .parse::<i64>()
            .map_err(|e| invalid(format!("script id is not a number ({e})")))?;
        if filename.is_empty() {
            return Err(invalid("filename is empty".to_string()).into());
        }

        Ok(AttachmentRecord {
            script_id: Attr::Known(script_id),
            filename: Attr::Known(filename.to_string()),
            ..AttachmentRecord::default()
        })
    }

    fn plan_change(&self, plan: &AttachmentPlan, current: &AttachmentRecord) -> ChangeKind {
        let prior = current.inputs();
        let mut fields = Vec::new();
        if plan.script_id.changed_from(&prior.script_id).is_some() {
            fields.push("script_id");
        }
        if plan.filename.changed_from(&prior.filename).is_some() {
            fields.push("filename");
        }
        if plan.content.changed_from(&prior.content).is_some() {
            fields.push("content");
        }
        if fields.is_empty() {
            ChangeKind::NoOp
        } else {
            ChangeKind::Replace(fields)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landscape::MockBackend;
    use serde_json::json;

    fn setup() -> (MockBackend, AttachmentResource) {
        let mock = MockBackend::new();
        mock.insert_script(json!({
            "id": 10,
            "title": "modern",
            "status": "ACTIVE",
            "interpreter": "/bin/sh",
            "code": "true",
            "attachments": [],
        }));
        mock.insert_script(json!({"id": 11, "title": "legacy", "status": "V1", "attachments": []}));
        let resource = AttachmentResource::new(Arc::new(mock.clone()));
        (mock, resource)
    }

    fn plan(script_id: i64, filename: &str, content: &str) -> AttachmentPlan {
        AttachmentPlan {
            script_id: Attr::Known(script_id),
            filename: Attr::Known(filename.to_string()),
            content: Attr::Known(content.to_string()),
        }
    }

    fn ctx() -> CallContext {
        CallContext::background()
    }

    #[test]
    fn test_create_modern_attachment_reads_content_back() {
        let (mock, resource) = setup();
        let record = resource.create(&ctx(), &plan(10, "env.txt", "A=1")).unwrap();

        assert!(record.id.is_known());
        assert_eq!(record.content, Attr::Known("A=1".into()));
        let sent = &mock.calls_to("CreateScriptAttachment")[0];
        assert_eq!(sent.get("file"), Some("env.txt$$QT0x"));
        assert_eq!(mock.calls_to("GetScriptAttachment").len(), 1);

        let again = resource.read(&ctx(), &record).unwrap().unwrap();
        assert_eq!(again, record);
    }

    #[test]
    fn test_legacy_attachment_has_no_id_and_keeps_content() {
        let (mock, resource) = setup();
        let record = resource.create(&ctx(), &plan(11, "run.sh", "echo")).unwrap();

        assert!(record.id.is_null());
        assert_eq!(record.content, Attr::Known("echo".into()));
        assert!(mock.calls_to("GetScriptAttachment").is_empty());
    }

    #[test]
    fn test_update_is_rejected_without_remote_call() {
        let (mock, resource) = setup();
        let record = resource.create(&ctx(), &plan(10, "a.txt", "one")).unwrap();
        mock.clear_calls();

        let planned = plan(10, "a.txt", "two");
        assert_eq!(
            resource.plan_change(&planned, &record),
            ChangeKind::Replace(vec!["content"])
        );
        let diags = resource.update(&ctx(), &planned, &record).unwrap_err();
        assert!(diags.to_string().contains("immutable"));
        assert!(diags.to_string().contains("recreate"));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_delete_then_read_is_absent() {
        let (mock, resource) = setup();
        let record = resource.create(&ctx(), &plan(10, "a.txt", "one")).unwrap();

        resource.delete(&ctx(), &record).unwrap();
        let removal = &mock.calls_to("RemoveScriptAttachment")[0];
        assert_eq!(removal.get("filename"), Some("a.txt"));
        assert!(removal.contains("attachment_id"));

        assert_eq!(resource.read(&ctx(), &record).unwrap(), None);
        resource.delete(&ctx(), &record).unwrap();
    }

    #[test]
    fn test_import_formats() {
        let (_mock, resource) = setup();
        let seed = resource.import_by_id("10/env.txt").unwrap();
        assert_eq!(seed.script_id, Attr::Known(10));
        assert_eq!(seed.filename, Attr::Known("env.txt".into()));
        assert!(seed.id.is_null());

        assert!(resource.import_by_id("10").is_err());
        assert!(resource.import_by_id("x/env.txt").is_err());
        assert!(resource.import_by_id("10/").is_err());
    }

    #[test]
    fn test_create_requires_inputs() {
        let (mock, resource) = setup();
        let diags = resource
            .create(&ctx(), &AttachmentPlan::default())
            .unwrap_err();
        assert_eq!(diags.errors().count(), 3);
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_missing_script_means_absent() {
        let (_mock, resource) = setup();
        let orphan = AttachmentRecord {
            script_id: Attr::Known(999),
            filename: Attr::Known("x".into()),
            ..AttachmentRecord::default()
        };
        assert_eq!(resource.read(&ctx(), &orphan).unwrap(), None);
    }
}
