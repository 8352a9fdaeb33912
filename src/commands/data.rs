//! `data`: run a data source and print the record as JSON.

use anyhow::{Context as AnyhowContext, Result, anyhow};
use scripts::AttachmentQuery;
use serde_json::Value;

use super::{connect, load_manifest_if_present};
use crate::Context;
use crate::cli::DataCommand;
use crate::provider::Provider;

pub fn run(ctx: &Context, cmd: &DataCommand) -> Result<()> {
    let manifest = load_manifest_if_present(ctx)?;
    let provider = connect(&manifest)?;
    let record = read_with(&provider, cmd)?;
    let text = serde_json::to_string_pretty(&record).context("Failed to render record")?;
    println!("{text}");
    Ok(())
}

pub fn read_with(provider: &Provider, cmd: &DataCommand) -> Result<Value> {
    let (label, result) = match *cmd {
        DataCommand::Script { id, kind } => (
            format!("script {id}"),
            provider.script_data(kind.into(), id),
        ),
        DataCommand::Attachment {
            script_id,
            attachment_id,
        } => (
            format!("attachment {attachment_id} of script {script_id}"),
            provider.attachment_data(AttachmentQuery {
                script_id,
                attachment_id,
            }),
        ),
    };
    let stored = result.map_err(|diags| anyhow!("Could not read {label}:\n{diags}"))?;
    Ok(stored.to_json())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ScriptKind;
    use landscape::MockBackend;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn provider() -> Provider {
        let mock = MockBackend::new();
        mock.insert_script(json!({
            "id": 1,
            "title": "archived",
            "status": "ARCHIVED",
            "interpreter": "/bin/sh",
            "code": "true",
            "attachments": [{"id": 5, "filename": "a.txt"}],
        }));
        mock.insert_attachment_content(1, 5, "alpha");
        Provider::new(Arc::new(mock), Duration::from_secs(30))
    }

    #[test]
    fn test_archived_script_is_readable() {
        let record = read_with(
            &provider(),
            &DataCommand::Script {
                id: 1,
                kind: ScriptKind::Script,
            },
        )
        .unwrap();
        assert_eq!(record["status"], "archived");
        assert_eq!(record["attachments"][0]["filename"], "a.txt");
    }

    #[test]
    fn test_missing_script_is_an_error() {
        let err = read_with(
            &provider(),
            &DataCommand::Script {
                id: 2,
                kind: ScriptKind::ScriptV2,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Could not read script 2"));
    }

    #[test]
    fn test_attachment_lookup() {
        let record = read_with(
            &provider(),
            &DataCommand::Attachment {
                script_id: 1,
                attachment_id: 5,
            },
        )
        .unwrap();
        assert_eq!(record["content"], "alpha");
    }
}
