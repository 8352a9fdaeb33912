//! The manifest: declared scripts and attachments.
//!
//! ```toml
//! [provider]
//! api_url = "https://landscape.example.com/api/"
//!
//! [scripts.deploy]
//! kind = "script_v2"
//! title = "Deploy"
//! code_file = "scripts/deploy.sh"
//! time_limit = 300
//!
//! [attachments.deploy_env]
//! script = "deploy"
//! filename = "env.txt"
//! content = "STAGE=prod"
//! ```
//!
//! Attributes left out are unknown: the server decides them and the plan
//! never sends them.

use anyhow::{Context, Result, bail};
use scripts::{AttachmentPlan, Attr, ScriptPlan};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::address::{Address, Kind};
use crate::config::ProviderSettings;

/// Default manifest filename.
pub const DEFAULT_MANIFEST: &str = "landscape.toml";

// ============================================================================
// File format
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    provider: ProviderSettings,
    #[serde(default)]
    scripts: BTreeMap<String, ScriptEntry>,
    #[serde(default)]
    attachments: BTreeMap<String, AttachmentEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptEntry {
    kind: Option<String>,
    title: Option<String>,
    code: Option<String>,
    code_file: Option<String>,
    script_type: Option<String>,
    username: Option<String>,
    time_limit: Option<i64>,
    access_group: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttachmentEntry {
    script: Option<String>,
    script_id: Option<i64>,
    filename: Option<String>,
    content: Option<String>,
    content_file: Option<String>,
}

// ============================================================================
// Desired state
// ============================================================================

/// The declared inputs of one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Desired {
    Script(ScriptPlan),
    Attachment {
        plan: AttachmentPlan,
        /// Owning script declared in the same manifest; its id is filled in
        /// from state once the script exists.
        script: Option<Address>,
    },
}

/// A loaded manifest.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub provider: ProviderSettings,
    pub instances: BTreeMap<Address, Desired>,
}

impl Manifest {
    /// Read and check a manifest. Relative file references resolve against
    /// the manifest's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, base)
            .with_context(|| format!("Invalid manifest {}", path.display()))
    }

    /// Parse manifest text.
    pub fn parse(content: &str, base: &Path) -> Result<Self> {
        let file: ManifestFile = toml::from_str(content).context("Failed to parse TOML")?;
        let mut problems = Vec::new();
        let mut instances = BTreeMap::new();

        let mut script_kinds = BTreeMap::new();
        for (name, entry) in file.scripts {
            let kind = match entry.kind.as_deref() {
                None => Kind::Script,
                Some(raw) => match Kind::parse(raw) {
                    Some(kind) if kind.is_script() => kind,
                    _ => {
                        problems.push(format!(
                            "scripts.{name}: kind must be script, script_v1 or script_v2 (got '{raw}')"
                        ));
                        continue;
                    }
                },
            };
            let code = match read_inline_or_file(entry.code, entry.code_file, base, "code") {
                Ok(code) => code,
                Err(problem) => {
                    problems.push(format!("scripts.{name}: {problem}"));
                    continue;
                }
            };

            script_kinds.insert(name.clone(), kind);
            let plan = ScriptPlan {
                title: Attr::known_or_unknown(entry.title),
                code: Attr::known_or_unknown(code),
                username: Attr::known_or_unknown(entry.username),
                time_limit: Attr::known_or_unknown(entry.time_limit),
                access_group: Attr::known_or_unknown(entry.access_group),
                script_type: Attr::known_or_unknown(entry.script_type),
            };
            instances.insert(Address::new(kind, name), Desired::Script(plan));
        }

        for (name, entry) in file.attachments {
            let script = match (entry.script, entry.script_id) {
                (Some(_), Some(_)) => {
                    problems.push(format!(
                        "attachments.{name}: set either script or script_id, not both"
                    ));
                    continue;
                }
                (None, None) => {
                    problems.push(format!("attachments.{name}: script or script_id is required"));
                    continue;
                }
                (Some(script), None) => match script_kinds.get(&script) {
                    Some(kind) => Some(Address::new(*kind, script)),
                    None => {
                        problems.push(format!(
                            "attachments.{name}: script '{script}' is not declared under [scripts]"
                        ));
                        continue;
                    }
                },
                (None, Some(_)) => None,
            };
            let content =
                match read_inline_or_file(entry.content, entry.content_file, base, "content") {
                    Ok(content) => content,
                    Err(problem) => {
                        problems.push(format!("attachments.{name}: {problem}"));
                        continue;
                    }
                };

            let plan = AttachmentPlan {
                script_id: Attr::known_or_unknown(entry.script_id),
                filename: Attr::known_or_unknown(entry.filename),
                content: Attr::known_or_unknown(content),
            };
            instances.insert(
                Address::new(Kind::ScriptAttachment, name),
                Desired::Attachment { plan, script },
            );
        }

        if !problems.is_empty() {
            bail!("{}", problems.join("\n"));
        }

        Ok(Self {
            provider: file.provider,
            instances,
        })
    }

    pub fn get(&self, address: &Address) -> Option<&Desired> {
        self.instances.get(address)
    }
}

fn read_inline_or_file(
    inline: Option<String>,
    file: Option<String>,
    base: &Path,
    attribute: &str,
) -> std::result::Result<Option<String>, String> {
    match (inline, file) {
        (Some(_), Some(_)) => Err(format!("set either {attribute} or {attribute}_file, not both")),
        (Some(inline), None) => Ok(Some(inline)),
        (None, Some(file)) => {
            let path = resolve_path(&file, base);
            fs::read_to_string(&path)
                .map(Some)
                .map_err(|e| format!("could not read {}: {e}", path.display()))
        }
        (None, None) => Ok(None),
    }
}

fn resolve_path(raw: &str, base: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = Manifest::parse(
            r##"
            [provider]
            api_url = "https://landscape.example.com/api/"
            access_key = "AK"

            [scripts.deploy]
            kind = "script_v2"
            title = "Deploy"
            code = "#!/bin/bash\n./deploy.sh"
            time_limit = 300

            [scripts.legacy]
            title = "Old"
            code = "echo"

            [attachments.env]
            script = "deploy"
            filename = "env.txt"
            content = "A=1"

            [attachments.pinned]
            script_id = 42
            filename = "x.ini"
            content = ""
            "##,
            Path::new("."),
        )
        .unwrap();

        assert_eq!(manifest.provider.access_key.as_deref(), Some("AK"));
        assert_eq!(manifest.instances.len(), 4);

        let Some(Desired::Script(deploy)) = manifest.get(&Address::new(Kind::ScriptV2, "deploy"))
        else {
            panic!("deploy missing");
        };
        assert_eq!(deploy.time_limit, Attr::Known(300));
        assert!(deploy.username.is_unknown());

        assert!(manifest.get(&Address::new(Kind::Script, "legacy")).is_some());

        let Some(Desired::Attachment { plan, script }) =
            manifest.get(&Address::new(Kind::ScriptAttachment, "env"))
        else {
            panic!("env missing");
        };
        assert_eq!(script, &Some(Address::new(Kind::ScriptV2, "deploy")));
        assert!(plan.script_id.is_unknown());

        let Some(Desired::Attachment { plan, script }) =
            manifest.get(&Address::new(Kind::ScriptAttachment, "pinned"))
        else {
            panic!("pinned missing");
        };
        assert_eq!(script, &None);
        assert_eq!(plan.script_id, Attr::Known(42));
        assert_eq!(plan.content, Attr::Known(String::new()));
    }

    #[test]
    fn test_code_file_is_relative_to_manifest() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("bin/run.sh"), "#!/bin/sh\ntrue\n").unwrap();
        let path = dir.path().join("landscape.toml");
        fs::write(
            &path,
            "[scripts.run]\ntitle = \"Run\"\ncode_file = \"bin/run.sh\"\n",
        )
        .unwrap();

        let manifest = Manifest::load(&path).unwrap();
        let Some(Desired::Script(plan)) = manifest.get(&Address::new(Kind::Script, "run")) else {
            panic!("run missing");
        };
        assert_eq!(plan.code, Attr::Known("#!/bin/sh\ntrue\n".into()));
    }

    #[test]
    fn test_problems_are_collected() {
        let err = Manifest::parse(
            r#"
            [scripts.a]
            kind = "script_attachment"

            [scripts.b]
            code = "x"
            code_file = "y"

            [attachments.c]
            filename = "f"

            [attachments.d]
            script = "nope"
            "#,
            Path::new("."),
        )
        .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("scripts.a: kind"));
        assert!(message.contains("scripts.b: set either code or code_file"));
        assert!(message.contains("attachments.c: script or script_id is required"));
        assert!(message.contains("attachments.d: script 'nope'"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(Manifest::parse("[scripts.a]\ntitel = \"x\"\n", Path::new(".")).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Manifest::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read manifest"));
    }
}
