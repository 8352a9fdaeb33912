//! `import`: record an existing remote object under an address.

use anyhow::{Result, anyhow, bail};

use super::{connect, load_manifest_if_present};
use crate::Context;
use crate::address::Address;
use crate::manifest::Manifest;
use crate::provider::Provider;
use crate::state::{StateFile, StoredState};
use crate::ui;

pub fn run(ctx: &Context, address: &Address, id: &str) -> Result<()> {
    let manifest = load_manifest_if_present(ctx)?;
    let provider = connect(&manifest)?;
    import_with(ctx, &manifest, &provider, address, id)?;
    Ok(())
}

pub fn import_with(
    ctx: &Context,
    manifest: &Manifest,
    provider: &Provider,
    address: &Address,
    id: &str,
) -> Result<StoredState> {
    let mut state = StateFile::load(&ctx.state)?;
    if let Some(existing) = state.get(address) {
        bail!(
            "{address} is already managed (id {}); remove it from state first",
            existing.remote_id()
        );
    }

    let imported = provider
        .import(address.kind, id)
        .map_err(|diags| anyhow!("Import of {address} failed:\n{diags}"))?
        .ok_or_else(|| anyhow!("No live {} found for id {id}", address.kind))?;

    state.insert(address.clone(), imported.clone());
    state.save(&ctx.state)?;
    ui::success(&format!("Imported {address} (id {})", imported.remote_id()));

    if manifest.get(address).is_none() {
        ui::warn(&format!(
            "{address} is not in the manifest; the next apply will delete it"
        ));
    }
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Kind;
    use landscape::MockBackend;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Context, Provider) {
        let dir = TempDir::new().unwrap();
        let ctx = Context::for_paths(dir.path().join("landscape.toml"), None);
        let mock = MockBackend::new();
        mock.insert_script(json!({
            "id": 8,
            "title": "nightly",
            "status": "ACTIVE",
            "interpreter": "/bin/bash",
            "code": "backup",
            "attachments": [{"id": 2, "filename": "hosts"}],
        }));
        mock.insert_attachment_content(8, 2, "db1\ndb2\n");
        let provider = Provider::new(Arc::new(mock), Duration::from_secs(30));
        (dir, ctx, provider)
    }

    #[test]
    fn test_import_script_and_attachment() {
        let (_dir, ctx, provider) = setup();
        let manifest = Manifest::default();

        let script = import_with(
            &ctx,
            &manifest,
            &provider,
            &Address::new(Kind::ScriptV2, "nightly"),
            "8",
        )
        .unwrap();
        assert_eq!(script.to_json()["code"], "#!/bin/bash\nbackup");

        let attachment = import_with(
            &ctx,
            &manifest,
            &provider,
            &Address::new(Kind::ScriptAttachment, "hosts"),
            "8/hosts",
        )
        .unwrap();
        assert_eq!(attachment.to_json()["content"], "db1\ndb2\n");
        assert_eq!(attachment.to_json()["id"], 2);

        let state = StateFile::load(&ctx.state).unwrap();
        assert_eq!(state.resources.len(), 2);
    }

    #[test]
    fn test_import_errors() {
        let (_dir, ctx, provider) = setup();
        let manifest = Manifest::default();
        let address = Address::new(Kind::Script, "x");

        let missing = import_with(&ctx, &manifest, &provider, &address, "99").unwrap_err();
        assert!(missing.to_string().contains("No live script"));

        let bad = import_with(&ctx, &manifest, &provider, &address, "eight").unwrap_err();
        assert!(bad.to_string().contains("Import of script.x failed"));

        import_with(&ctx, &manifest, &provider, &address, "8").unwrap();
        let twice = import_with(&ctx, &manifest, &provider, &address, "8").unwrap_err();
        assert!(twice.to_string().contains("already managed"));
    }
}
