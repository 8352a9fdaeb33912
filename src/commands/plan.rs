//! `plan`: refresh in memory, compare with the manifest, print the changes.

use anyhow::Result;

use super::{connect, load_manifest};
use crate::Context;
use crate::engine::{self, ExecutionPlan};
use crate::manifest::Manifest;
use crate::provider::Provider;
use crate::state::StateFile;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let manifest = load_manifest(ctx)?;
    let provider = connect(&manifest)?;
    let mut state = StateFile::load(&ctx.state)?;
    plan_with(ctx, &manifest, &mut state, &provider);
    Ok(())
}

/// Refresh `state` in memory and print the plan against it.
pub fn plan_with(
    ctx: &Context,
    manifest: &Manifest,
    state: &mut StateFile,
    provider: &Provider,
) -> ExecutionPlan {
    if ctx.verbose > 0 {
        ui::kv("manifest", &ctx.manifest.display().to_string());
        ui::kv("state", &ctx.state.display().to_string());
    }
    if !state.is_empty() {
        if !ctx.quiet {
            ui::section("Refreshing state");
        }
        let drift = engine::refresh_state(provider, state);
        if !ctx.quiet && !drift.is_clean() {
            engine::display_drift(&drift);
        }
    }

    let plan = engine::plan(manifest, state, provider);
    if !ctx.quiet {
        ui::header("Plan");
    }
    engine::differ::display_plan(&plan, manifest, state);
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Address, Kind};
    use crate::engine::Action;
    use landscape::MockBackend;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_plan_does_not_write_state() {
        let dir = TempDir::new().unwrap();
        let ctx = Context::for_paths(dir.path().join("landscape.toml"), None);
        let manifest = Manifest::parse(
            "[scripts.hello]\ntitle = \"Hello\"\ncode = \"echo hello\"\n",
            Path::new("."),
        )
        .unwrap();
        let mock = MockBackend::new();
        let provider = Provider::new(Arc::new(mock.clone()), Duration::from_secs(30));

        let mut state = StateFile::default();
        let plan = plan_with(&ctx, &manifest, &mut state, &provider);

        assert_eq!(
            plan.action_for(&Address::new(Kind::Script, "hello")),
            Some(&Action::Create)
        );
        assert!(mock.calls().is_empty());
        assert!(!ctx.state.exists());
    }
}
