//! Dispatch from addresses and stored records to the resource kinds.

use anyhow::{Context, Result};
use landscape::backend::http::HttpBackend;
use landscape::{Backend, CallContext};
use scripts::{
    AttachmentDataSource, AttachmentQuery, AttachmentResource, ChangeKind, DataSource,
    Diagnostics, LegacyScriptRecord, ManagedResource, Outcome, ScriptDataSource, ScriptRecord,
    ScriptResource,
};
use std::sync::Arc;
use std::time::Duration;

use crate::address::Kind;
use crate::config::ConnectionSettings;
use crate::manifest::Desired;
use crate::state::StoredState;

/// Requests one operation may make (create, read back, fetch code or
/// content), used to turn the per-request timeout into an operation deadline.
const REQUESTS_PER_OPERATION: u32 = 4;

/// Every resource kind and data source over one backend.
pub struct Provider {
    backend: Arc<dyn Backend>,
    scripts: ScriptResource<ScriptRecord>,
    scripts_v2: ScriptResource<ScriptRecord>,
    scripts_v1: ScriptResource<LegacyScriptRecord>,
    attachments: AttachmentResource,
    operation_timeout: Duration,
}

impl Provider {
    /// Log in and build the provider.
    pub fn connect(settings: &ConnectionSettings) -> Result<Self> {
        log::info!(
            "Logging in to {} with {} credentials",
            settings.api_url,
            settings.credentials.kind()
        );
        let backend = HttpBackend::connect(&settings.api_url, &settings.credentials, settings.timeout)
            .map_err(|e| {
                let advice = e.category().advice();
                anyhow::Error::new(e).context(format!("Login failed ({advice})"))
            })
            .with_context(|| format!("Could not connect to {}", settings.api_url))?;
        Ok(Self::new(Arc::new(backend), settings.timeout))
    }

    pub fn new(backend: Arc<dyn Backend>, request_timeout: Duration) -> Self {
        Self {
            scripts: ScriptResource::unified(Arc::clone(&backend)),
            scripts_v2: ScriptResource::modern(Arc::clone(&backend)),
            scripts_v1: ScriptResource::legacy(Arc::clone(&backend)),
            attachments: AttachmentResource::new(Arc::clone(&backend)),
            backend,
            operation_timeout: request_timeout.saturating_mul(REQUESTS_PER_OPERATION),
        }
    }

    /// A fresh context for one operation.
    fn context(&self) -> CallContext {
        CallContext::with_timeout(self.operation_timeout)
    }

    // ========================================================================
    // Managed resources
    // ========================================================================

    pub fn create(&self, kind: Kind, desired: &Desired) -> Outcome<StoredState> {
        let ctx = self.context();
        match (kind, desired) {
            (Kind::Script, Desired::Script(plan)) => {
                self.scripts.create(&ctx, plan).map(StoredState::Script)
            }
            (Kind::ScriptV2, Desired::Script(plan)) => {
                self.scripts_v2.create(&ctx, plan).map(StoredState::ScriptV2)
            }
            (Kind::ScriptV1, Desired::Script(plan)) => {
                self.scripts_v1.create(&ctx, plan).map(StoredState::ScriptV1)
            }
            (Kind::ScriptAttachment, Desired::Attachment { plan, .. }) => self
                .attachments
                .create(&ctx, plan)
                .map(StoredState::ScriptAttachment),
            _ => Err(kind_mismatch(kind)),
        }
    }

    /// Read an instance back. `None` means it is gone.
    pub fn read(&self, stored: &StoredState) -> Outcome<Option<StoredState>> {
        let ctx = self.context();
        Ok(match stored {
            StoredState::Script(record) => self.scripts.read(&ctx, record)?.map(StoredState::Script),
            StoredState::ScriptV2(record) => {
                self.scripts_v2.read(&ctx, record)?.map(StoredState::ScriptV2)
            }
            StoredState::ScriptV1(record) => {
                self.scripts_v1.read(&ctx, record)?.map(StoredState::ScriptV1)
            }
            StoredState::ScriptAttachment(record) => self
                .attachments
                .read(&ctx, record)?
                .map(StoredState::ScriptAttachment),
        })
    }

    pub fn update(&self, desired: &Desired, stored: &StoredState) -> Outcome<StoredState> {
        let ctx = self.context();
        match (desired, stored) {
            (Desired::Script(plan), StoredState::Script(record)) => {
                self.scripts.update(&ctx, plan, record).map(StoredState::Script)
            }
            (Desired::Script(plan), StoredState::ScriptV2(record)) => self
                .scripts_v2
                .update(&ctx, plan, record)
                .map(StoredState::ScriptV2),
            (Desired::Script(plan), StoredState::ScriptV1(record)) => self
                .scripts_v1
                .update(&ctx, plan, record)
                .map(StoredState::ScriptV1),
            (Desired::Attachment { plan, .. }, StoredState::ScriptAttachment(record)) => self
                .attachments
                .update(&ctx, plan, record)
                .map(StoredState::ScriptAttachment),
            _ => Err(kind_mismatch(stored.kind())),
        }
    }

    pub fn delete(&self, stored: &StoredState) -> Outcome<()> {
        let ctx = self.context();
        match stored {
            StoredState::Script(record) => self.scripts.delete(&ctx, record),
            StoredState::ScriptV2(record) => self.scripts_v2.delete(&ctx, record),
            StoredState::ScriptV1(record) => self.scripts_v1.delete(&ctx, record),
            StoredState::ScriptAttachment(record) => self.attachments.delete(&ctx, record),
        }
    }

    pub fn plan_change(&self, desired: &Desired, stored: &StoredState) -> ChangeKind {
        match (desired, stored) {
            (Desired::Script(plan), StoredState::Script(record)) => {
                self.scripts.plan_change(plan, record)
            }
            (Desired::Script(plan), StoredState::ScriptV2(record)) => {
                self.scripts_v2.plan_change(plan, record)
            }
            (Desired::Script(plan), StoredState::ScriptV1(record)) => {
                self.scripts_v1.plan_change(plan, record)
            }
            (Desired::Attachment { plan, .. }, StoredState::ScriptAttachment(record)) => {
                self.attachments.plan_change(plan, record)
            }
            _ => ChangeKind::Replace(vec!["kind"]),
        }
    }

    /// Seed a state from an external id and read it. `None` means nothing
    /// exists under that id.
    pub fn import(&self, kind: Kind, id: &str) -> Outcome<Option<StoredState>> {
        let seed = match kind {
            Kind::Script => StoredState::Script(self.scripts.import_by_id(id)?),
            Kind::ScriptV2 => StoredState::ScriptV2(self.scripts_v2.import_by_id(id)?),
            Kind::ScriptV1 => StoredState::ScriptV1(self.scripts_v1.import_by_id(id)?),
            Kind::ScriptAttachment => {
                StoredState::ScriptAttachment(self.attachments.import_by_id(id)?)
            }
        };
        self.read(&seed)
    }

    // ========================================================================
    // Data sources
    // ========================================================================

    /// Look a script up by id with the data source of `kind`.
    pub fn script_data(&self, kind: Kind, id: i64) -> Outcome<StoredState> {
        let ctx = self.context();
        let backend = Arc::clone(&self.backend);
        match kind {
            Kind::Script => ScriptDataSource::unified(backend)
                .read(&ctx, &id)
                .map(StoredState::Script),
            Kind::ScriptV2 => ScriptDataSource::modern(backend)
                .read(&ctx, &id)
                .map(StoredState::ScriptV2),
            Kind::ScriptV1 => ScriptDataSource::legacy(backend)
                .read(&ctx, &id)
                .map(StoredState::ScriptV1),
            Kind::ScriptAttachment => Err(kind_mismatch(kind)),
        }
    }

    /// Look an attachment up by script id and attachment id.
    pub fn attachment_data(&self, query: AttachmentQuery) -> Outcome<StoredState> {
        AttachmentDataSource::new(Arc::clone(&self.backend))
            .read(&self.context(), &query)
            .map(StoredState::ScriptAttachment)
    }
}

fn kind_mismatch(kind: Kind) -> Diagnostics {
    let mut diags = Diagnostics::new();
    diags.add_error(
        "Kind mismatch",
        format!("the declared inputs do not belong to a {kind} instance"),
    );
    diags
}
