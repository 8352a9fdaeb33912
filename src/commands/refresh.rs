//! `refresh`: re-read every managed instance, report drift, persist.

use anyhow::Result;

use super::{connect, load_manifest};
use crate::Context;
use crate::engine::{self, Drift};
use crate::provider::Provider;
use crate::state::StateFile;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let manifest = load_manifest(ctx)?;
    let provider = connect(&manifest)?;
    refresh_with(ctx, &provider)?;
    Ok(())
}

pub fn refresh_with(ctx: &Context, provider: &Provider) -> Result<Drift> {
    let mut state = StateFile::load(&ctx.state)?;
    if state.is_empty() {
        ui::info("No managed instances recorded");
        return Ok(Drift::default());
    }

    if !ctx.quiet {
        ui::header("Refresh");
    }
    let drift = engine::refresh_state(provider, &mut state);
    engine::display_drift(&drift);
    state.save(&ctx.state)?;
    Ok(drift)
}
