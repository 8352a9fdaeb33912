//! Read-only data sources.
//!
//! Unlike resources, data sources report archived scripts as present (with
//! status `archived`) and treat a missing object as an error.

use std::marker::PhantomData;
use std::sync::Arc;

use landscape::{Backend, CallContext};
use serde::{Deserialize, Serialize};

use crate::content::fetch_attachment_content;
use crate::diagnostics::Outcome;
use crate::error::{Error, expect_ok};
use crate::project::{ScriptState, VariantPolicy, resolve};
use crate::record::{AttachmentRecord, LegacyScriptRecord, ScriptRecord};
use crate::resource::DataSource;
use crate::value::Attr;
use crate::variant::{Script, Variant, decode};

/// Script lookup by id.
pub struct ScriptDataSource<R> {
    backend: Arc<dyn Backend>,
    policy: VariantPolicy,
    _record: PhantomData<fn() -> R>,
}

impl ScriptDataSource<ScriptRecord> {
    /// The `script` data source: either generation.
    pub fn unified(backend: Arc<dyn Backend>) -> Self {
        Self::with_policy(backend, VariantPolicy::Any)
    }

    /// The `script_v2` data source.
    pub fn modern(backend: Arc<dyn Backend>) -> Self {
        Self::with_policy(backend, VariantPolicy::Only(Variant::Modern))
    }
}

impl ScriptDataSource<LegacyScriptRecord> {
    /// The `script_v1` data source.
    pub fn legacy(backend: Arc<dyn Backend>) -> Self {
        Self::with_policy(backend, VariantPolicy::Only(Variant::Legacy))
    }
}

impl<R> ScriptDataSource<R> {
    fn with_policy(backend: Arc<dyn Backend>, policy: VariantPolicy) -> Self {
        Self {
            backend,
            policy,
            _record: PhantomData,
        }
    }
}

impl<R: ScriptState> DataSource for ScriptDataSource<R> {
    type Query = i64;
    type Record = R;

    fn type_name(&self) -> &'static str {
        match self.policy {
            VariantPolicy::Any => "script",
            VariantPolicy::Only(Variant::Legacy) => "script_v1",
            VariantPolicy::Only(Variant::Modern) => "script_v2",
        }
    }

    fn read(&self, ctx: &CallContext, id: &i64) -> Outcome<R> {
        let operation = format!("read script {id}");
        let response = self
            .backend
            .get_script(ctx, *id)
            .map_err(Error::transport(&operation))?;
        let raw = expect_ok(response, &operation)?;
        let resolved = resolve(self.backend.as_ref(), ctx, &raw, self.policy.pinned(), self.policy)?;
        Ok(R::project(&resolved)?)
    }
}

/// Key of the attachment data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentQuery {
    /// Owning script.
    pub script_id: i64,
    /// Attachment id.
    pub attachment_id: i64,
}

/// Attachment lookup by id. Modern scripts only.
pub struct AttachmentDataSource {
    backend: Arc<dyn Backend>,
}

impl AttachmentDataSource {
    /// Create the data source.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

impl DataSource for AttachmentDataSource {
    type Query = AttachmentQuery;
    type Record = AttachmentRecord;

    fn type_name(&self) -> &'static str {
        "script_attachment"
    }

    fn read(&self, ctx: &CallContext, query: &AttachmentQuery) -> Outcome<AttachmentRecord> {
        let AttachmentQuery {
            script_id,
            attachment_id,
        } = *query;
        let operation = format!("read script {script_id}");
        let response = self
            .backend
            .get_script(ctx, script_id)
            .map_err(Error::transport(&operation))?;

        let script = match decode(&expect_ok(response, &operation)?, Some(Variant::Modern))? {
            Script::Modern(script) => script,
            Script::Legacy(_) => {
                return Err(Error::Unsupported(format!(
                    "script {script_id} is a V1 script; attachments can only be looked up on V2 scripts"
                ))
                .into());
            }
        };

        let entry = script
            .attachments
            .find_by_id(attachment_id)
            .ok_or_else(|| Error::NotFound {
                operation: format!("find attachment {attachment_id}"),
                message: format!("script {script_id} has no attachment with that id"),
            })?;
        let content = fetch_attachment_content(self.backend.as_ref(), ctx, script_id, attachment_id)?;

        Ok(AttachmentRecord {
            id: Attr::Known(attachment_id),
            script_id: Attr::Known(script_id),
            filename: Attr::Known(entry.filename),
            content: Attr::Known(content),
        })
    }
}
