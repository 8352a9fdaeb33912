//! Command implementations.
//!
//! Each command has a `run` entry point that loads files and logs in, and a
//! `*_with` function taking an already built [`Provider`] so it can be
//! driven against a mock backend.

pub mod apply;
pub mod data;
pub mod import;
pub mod plan;
pub mod refresh;

use anyhow::{Context as AnyhowContext, Result};

use crate::Context;
use crate::manifest::Manifest;
use crate::provider::Provider;

/// Load the manifest named on the command line.
pub fn load_manifest(ctx: &Context) -> Result<Manifest> {
    Manifest::load(&ctx.manifest)
}

/// Load the manifest if it exists; commands that only need credentials can
/// run from environment variables alone.
pub fn load_manifest_if_present(ctx: &Context) -> Result<Manifest> {
    if ctx.manifest.exists() {
        load_manifest(ctx)
    } else {
        log::debug!(
            "{} not found, using environment settings only",
            ctx.manifest.display()
        );
        Ok(Manifest::default())
    }
}

/// Validate provider settings and log in.
pub fn connect(manifest: &Manifest) -> Result<Provider> {
    let settings = manifest.provider.clone().with_env().validate()?;
    Provider::connect(&settings)
}

/// Confirm with user
pub fn confirm_proceed(prompt: &str) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Confirmation needs an interactive terminal; pass --yes to skip it")?;

    Ok(confirmed)
}
