//! Script resources: one implementation for the unified and pinned kinds.

use std::marker::PhantomData;
use std::sync::Arc;

use landscape::{Backend, CallContext, LegacyAction, Params};

use crate::diagnostics::{Diagnostics, Outcome};
use crate::error::{Error, Result, expect_ok};
use crate::params::{self, NewScript, ScriptChanges};
use crate::project::{ScriptState, VariantPolicy, fetch_script, resolve};
use crate::record::{LegacyScriptRecord, ScriptPlan, ScriptRecord};
use crate::resource::{ChangeKind, ManagedResource};
use crate::variant::Variant;

/// A script resource kind, parameterized by the state record it produces.
pub struct ScriptResource<R> {
    backend: Arc<dyn Backend>,
    policy: VariantPolicy,
    _record: PhantomData<fn() -> R>,
}

impl ScriptResource<ScriptRecord> {
    /// The `script` kind: either generation, legacy by default.
    pub fn unified(backend: Arc<dyn Backend>) -> Self {
        Self::with_policy(backend, VariantPolicy::Any)
    }

    /// The `script_v2` kind: modern scripts only.
    pub fn modern(backend: Arc<dyn Backend>) -> Self {
        Self::with_policy(backend, VariantPolicy::Only(Variant::Modern))
    }
}

impl ScriptResource<LegacyScriptRecord> {
    /// The `script_v1` kind: legacy scripts only.
    pub fn legacy(backend: Arc<dyn Backend>) -> Self {
        Self::with_policy(backend, VariantPolicy::Only(Variant::Legacy))
    }
}

impl<R: ScriptState> ScriptResource<R> {
    fn with_policy(backend: Arc<dyn Backend>, policy: VariantPolicy) -> Self {
        Self {
            backend,
            policy,
            _record: PhantomData,
        }
    }

    /// Check create inputs before anything is sent. Reports every problem.
    fn validate_create(&self, plan: &ScriptPlan) -> Outcome<NewScript> {
        let mut diags = Diagnostics::new();

        let title = plan.title.known();
        if title.is_none() {
            diags.push_error(&Error::MissingInput("title"));
        }
        let code = plan.code.known();
        if code.is_none() {
            diags.push_error(&Error::MissingInput("code"));
        }

        let variant = match plan.script_type.known() {
            Some(selector) => Variant::from_selector(selector).or_else(|| {
                diags.push_error(&Error::Unsupported(format!(
                    "script_type must be V1 or V2, got {selector:?}"
                )));
                None
            }),
            None => Some(self.policy.default_variant()),
        };
        if let (Some(pinned), Some(selected)) = (self.policy.pinned(), variant)
            && pinned != selected
        {
            diags.push_error(&Error::Unsupported(format!(
                "{} only manages {} scripts",
                self.type_name(),
                pinned.selector()
            )));
        }

        let (Some(title), Some(code), Some(variant)) = (title, code, variant) else {
            return Err(diags);
        };
        diags.check()?;

        Ok(NewScript {
            title: title.clone(),
            code: code.clone(),
            variant,
            username: plan.username.known().cloned(),
            time_limit: plan.time_limit.known().copied(),
            access_group: plan.access_group.known().cloned(),
        })
    }

    /// Re-read after a mutation. The script must still exist.
    fn read_back(&self, ctx: &CallContext, id: i64, hint: Option<Variant>) -> Result<R> {
        match fetch_script(self.backend.as_ref(), ctx, id, hint, self.policy)? {
            Some(resolved) => R::project(&resolved),
            None => Err(Error::NotFound {
                operation: format!("read script {id} after update"),
                message: "the script disappeared".to_string(),
            }),
        }
    }

    /// `EditScript` parameters for the recorded generation.
    fn edit_params(variant: Option<Variant>, id: i64, changes: &ScriptChanges) -> Result<Params> {
        if variant == Some(Variant::Legacy) && changes.access_group.is_some() {
            return Err(Error::Unsupported(
                "access_group of a V1 script cannot be changed in place; replace the script"
                    .to_string(),
            ));
        }
        Ok(params::edit_script(id, changes))
    }
}

impl<R: ScriptState> ManagedResource for ScriptResource<R> {
    type Plan = ScriptPlan;
    type State = R;

    fn type_name(&self) -> &'static str {
        match self.policy {
            VariantPolicy::Any => "script",
            VariantPolicy::Only(Variant::Legacy) => "script_v1",
            VariantPolicy::Only(Variant::Modern) => "script_v2",
        }
    }

    fn create(&self, ctx: &CallContext, plan: &ScriptPlan) -> Outcome<R> {
        let new_script = self.validate_create(plan)?;
        let requested = new_script.variant;
        let operation = format!("create {} script", requested.selector());

        let response = self
            .backend
            .invoke_legacy_action(ctx, LegacyAction::CreateScript, &params::create_script(&new_script))
            .map_err(Error::transport(&operation))?;
        let raw = expect_ok(response, &operation)?;

        let resolved = resolve(self.backend.as_ref(), ctx, &raw, Some(requested), self.policy)?;
        if resolved.variant() != requested {
            log::warn!(
                "requested a {} script but the server created {} script {}",
                requested,
                resolved.variant(),
                resolved.id()
            );
        }
        log::debug!("created {} script {}", resolved.variant(), resolved.id());
        Ok(R::project(&resolved)?)
    }

    fn read(&self, ctx: &CallContext, current: &R) -> Outcome<Option<R>> {
        let id = current.id().ok_or(Error::MissingInput("id"))?;
        match fetch_script(self.backend.as_ref(), ctx, id, current.variant(), self.policy)? {
            None => {
                log::info!("script {id} no longer exists");
                Ok(None)
            }
            Some(resolved) if resolved.is_archived() => {
                log::info!("script {id} is archived, treating it as deleted");
                Ok(None)
            }
            Some(resolved) => Ok(Some(R::project(&resolved)?)),
        }
    }

    fn update(&self, ctx: &CallContext, plan: &ScriptPlan, current: &R) -> Outcome<R> {
        let id = current.id().ok_or(Error::MissingInput("id"))?;
        let variant = current.variant();

        if let Some(selector) = plan.script_type.known() {
            match Variant::from_selector(selector) {
                None => {
                    return Err(Error::Unsupported(format!(
                        "script_type must be V1 or V2, got {selector:?}"
                    ))
                    .into());
                }
                Some(planned) if variant.is_some_and(|v| v != planned) => {
                    return Err(Error::Unsupported(
                        "script_type cannot change after creation; replace the script".to_string(),
                    )
                    .into());
                }
                Some(_) => {}
            }
        }

        let changes = plan.changes_from(&current.inputs());
        if changes.is_empty() {
            log::debug!("script {id}: no changed attributes to send");
        } else {
            let params = Self::edit_params(variant, id, &changes)?;
            let operation = format!("edit script {id}");
            log::debug!("{operation}: {}", changes.changed_fields().join(", "));
            let response = self
                .backend
                .invoke_legacy_action(ctx, LegacyAction::EditScript, &params)
                .map_err(Error::transport(&operation))?;
            // The echoed payload is not trusted; state comes from the re-read.
            expect_ok(response, &operation)?;
        }

        Ok(self.read_back(ctx, id, variant)?)
    }

    fn delete(&self, ctx: &CallContext, current: &R) -> Outcome<()> {
        let Some(id) = current.id() else {
            return Ok(());
        };
        let variant = match current.variant() {
            Some(variant) => variant,
            None => match fetch_script(self.backend.as_ref(), ctx, id, None, self.policy)? {
                Some(resolved) => resolved.variant(),
                None => return Ok(()),
            },
        };

        let (operation, response) = match variant {
            Variant::Legacy => {
                let operation = format!("remove script {id}");
                let response = self
                    .backend
                    .invoke_legacy_action(ctx, LegacyAction::RemoveScript, &params::remove_script(id))
                    .map_err(Error::transport(&operation))?;
                (operation, response)
            }
            Variant::Modern => {
                let operation = format!("archive script {id}");
                let response = self
                    .backend
                    .archive_script(ctx, id)
                    .map_err(Error::transport(&operation))?;
                (operation, response)
            }
        };

        if response.is_not_found() {
            log::info!("{operation}: already gone");
            return Ok(());
        }
        expect_ok(response, &operation)?;
        Ok(())
    }

    fn import_by_id(&self, id: &str) -> Outcome<R> {
        let parsed = id.trim().parse::<i64>().map_err(|e| Error::InvalidImportId {
            id: id.to_string(),
            reason: format!("expected a numeric script id ({e})"),
        })?;
        Ok(R::seed(parsed, self.policy.pinned()))
    }

    fn plan_change(&self, plan: &ScriptPlan, current: &R) -> ChangeKind {
        let recorded = current.variant();
        if let Some(selector) = plan.script_type.known() {
            match (Variant::from_selector(selector), recorded) {
                (Some(planned), Some(recorded)) if planned != recorded => {
                    return ChangeKind::Replace(vec!["script_type"]);
                }
                // Let update report the bad selector without destroying anything.
                (None, _) => return ChangeKind::Update(vec!["script_type"]),
                _ => {}
            }
        }

        let changes = plan.changes_from(&current.inputs());
        if recorded == Some(Variant::Legacy) && changes.access_group.is_some() {
            return ChangeKind::Replace(vec!["access_group"]);
        }
        let fields = changes.changed_fields();
        if fields.is_empty() {
            ChangeKind::NoOp
        } else {
            ChangeKind::Update(fields)
        }
    }
}
