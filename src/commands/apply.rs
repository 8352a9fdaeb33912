//! `apply` and `destroy`.

use anyhow::{Result, bail};

use super::{confirm_proceed, connect, load_manifest, plan::plan_with};
use crate::Context;
use crate::cli::{ApplyArgs, DestroyArgs};
use crate::engine::{self, ExecuteOptions, ExecuteSummary, ExecutionPlan};
use crate::manifest::Manifest;
use crate::provider::Provider;
use crate::state::StateFile;
use crate::ui;

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let manifest = load_manifest(ctx)?;
    let provider = connect(&manifest)?;
    let summary = apply_with(ctx, &manifest, &provider, args)?;
    finish(summary)
}

pub fn destroy(ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let manifest = load_manifest(ctx)?;
    let provider = connect(&manifest)?;
    let summary = destroy_with(ctx, &manifest, &provider, args)?;
    finish(summary)
}

/// Plan, confirm and execute. `None` means nothing was executed.
pub fn apply_with(
    ctx: &Context,
    manifest: &Manifest,
    provider: &Provider,
    args: &ApplyArgs,
) -> Result<Option<ExecuteSummary>> {
    let mut state = StateFile::load(&ctx.state)?;
    let plan = plan_with(ctx, manifest, &mut state, provider);

    if args.dry_run {
        println!();
        ui::info("Dry run - no changes made");
        return Ok(None);
    }
    // Refresh results are worth keeping even when nothing changes.
    if plan.is_empty() {
        state.save(&ctx.state)?;
        return Ok(None);
    }
    if !args.yes && !confirm_proceed("Apply these changes?")? {
        println!();
        ui::warn("Aborted");
        return Ok(None);
    }

    execute_and_save(ctx, &plan, manifest, &mut state, provider, args.jobs).map(Some)
}

/// Delete every recorded instance.
pub fn destroy_with(
    ctx: &Context,
    manifest: &Manifest,
    provider: &Provider,
    args: &DestroyArgs,
) -> Result<Option<ExecuteSummary>> {
    let mut state = StateFile::load(&ctx.state)?;
    let plan = engine::plan_destroy(&state);

    if plan.is_empty() {
        ui::success("Nothing to destroy");
        return Ok(None);
    }
    engine::differ::display_plan(&plan, manifest, &state);
    if !args.yes && !confirm_proceed("Destroy every managed instance?")? {
        println!();
        ui::warn("Aborted");
        return Ok(None);
    }

    execute_and_save(ctx, &plan, manifest, &mut state, provider, args.jobs).map(Some)
}

fn execute_and_save(
    ctx: &Context,
    plan: &ExecutionPlan,
    manifest: &Manifest,
    state: &mut StateFile,
    provider: &Provider,
    jobs: usize,
) -> Result<ExecuteSummary> {
    let opts = ExecuteOptions {
        jobs,
        verbose: ctx.verbose > 0,
    };
    println!();
    let summary = engine::execute(plan, manifest, state, provider, &opts)?;
    // Written once, with every successful result, even if some failed.
    state.save(&ctx.state)?;
    engine::print_summary(&summary);
    Ok(summary)
}

fn finish(summary: Option<ExecuteSummary>) -> Result<()> {
    match summary {
        Some(summary) if !summary.is_success() => {
            bail!("{} instances failed", summary.failures.len())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Address, Kind};
    use landscape::MockBackend;
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    const MANIFEST: &str = r##"
        [scripts.deploy]
        kind = "script_v2"
        title = "Deploy"
        code = "#!/bin/bash\n./deploy.sh"

        [attachments.env]
        script = "deploy"
        filename = "env.txt"
        content = "STAGE=prod"
    "##;

    struct Fixture {
        _dir: TempDir,
        ctx: Context,
        manifest: Manifest,
        mock: MockBackend,
        provider: Provider,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("landscape.toml");
        fs::write(&path, MANIFEST).unwrap();
        let ctx = Context::for_paths(path, None);
        let manifest = load_manifest(&ctx).unwrap();
        let mock = MockBackend::new();
        let provider = Provider::new(Arc::new(mock.clone()), Duration::from_secs(30));
        Fixture {
            _dir: dir,
            ctx,
            manifest,
            mock,
            provider,
        }
    }

    fn apply_args(dry_run: bool) -> ApplyArgs {
        ApplyArgs {
            jobs: 2,
            dry_run,
            yes: true,
        }
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let f = fixture();
        let summary = apply_with(&f.ctx, &f.manifest, &f.provider, &apply_args(true)).unwrap();
        assert!(summary.is_none());
        assert!(f.mock.calls().is_empty());
        assert!(!f.ctx.state.exists());
    }

    #[test]
    fn test_apply_writes_state_then_converges() {
        let f = fixture();
        let summary = apply_with(&f.ctx, &f.manifest, &f.provider, &apply_args(false))
            .unwrap()
            .unwrap();
        assert!(summary.is_success());
        assert_eq!(summary.created, 2);

        let state = StateFile::load(&f.ctx.state).unwrap();
        assert!(state.get(&Address::new(Kind::ScriptV2, "deploy")).is_some());
        assert!(state.get(&Address::new(Kind::ScriptAttachment, "env")).is_some());

        let again = apply_with(&f.ctx, &f.manifest, &f.provider, &apply_args(false)).unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn test_destroy_empties_state() {
        let f = fixture();
        apply_with(&f.ctx, &f.manifest, &f.provider, &apply_args(false)).unwrap();

        let args = DestroyArgs { jobs: 1, yes: true };
        let summary = destroy_with(&f.ctx, &f.manifest, &f.provider, &args)
            .unwrap()
            .unwrap();
        assert_eq!(summary.deleted, 2);
        assert!(StateFile::load(&f.ctx.state).unwrap().is_empty());

        assert!(destroy_with(&f.ctx, &f.manifest, &f.provider, &args).unwrap().is_none());
    }

    #[test]
    fn test_finish_fails_on_failures() {
        let mut summary = ExecuteSummary::default();
        assert!(finish(Some(ExecuteSummary::default())).is_ok());
        let mut diags = scripts::Diagnostics::new();
        diags.add_error("Request rejected", "nope");
        summary
            .failures
            .insert(Address::new(Kind::Script, "x"), diags);
        assert!(finish(Some(summary)).is_err());
        assert!(finish(None).is_ok());
    }
}
