use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use scripts::{AttachmentRecord, LegacyScriptRecord, ScriptRecord, ScriptState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::address::{Address, Kind};

/// Default state filename, next to the manifest.
pub const DEFAULT_STATE_FILE: &str = "landscape.state.json";

const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Recorded state of one managed instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum StoredState {
    Script(ScriptRecord),
    ScriptV1(LegacyScriptRecord),
    ScriptV2(ScriptRecord),
    ScriptAttachment(AttachmentRecord),
}

impl StoredState {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Script(_) => Kind::Script,
            Self::ScriptV1(_) => Kind::ScriptV1,
            Self::ScriptV2(_) => Kind::ScriptV2,
            Self::ScriptAttachment(_) => Kind::ScriptAttachment,
        }
    }

    /// Script id of a script instance.
    pub fn script_id(&self) -> Option<i64> {
        match self {
            Self::Script(record) | Self::ScriptV2(record) => record.id(),
            Self::ScriptV1(record) => record.id(),
            Self::ScriptAttachment(_) => None,
        }
    }

    /// Remote identity for display: script id or `<script_id>/<filename>`.
    pub fn remote_id(&self) -> String {
        match self {
            Self::ScriptAttachment(record) => format!(
                "{}/{}",
                record
                    .script_id
                    .known()
                    .map_or_else(|| "?".to_string(), ToString::to_string),
                record.filename.known().map_or("?", String::as_str)
            ),
            other => other
                .script_id()
                .map_or_else(|| "?".to_string(), |id| id.to_string()),
        }
    }

    /// The input attributes, as JSON, for comparison with a plan.
    pub fn inputs_json(&self) -> Value {
        let inputs = match self {
            Self::Script(record) | Self::ScriptV2(record) => serde_json::to_value(record.inputs()),
            Self::ScriptV1(record) => serde_json::to_value(record.inputs()),
            Self::ScriptAttachment(record) => serde_json::to_value(record.inputs()),
        };
        inputs.unwrap_or(Value::Null)
    }

    /// The whole record, as JSON.
    pub fn to_json(&self) -> Value {
        let record = match self {
            Self::Script(record) | Self::ScriptV2(record) => serde_json::to_value(record),
            Self::ScriptV1(record) => serde_json::to_value(record),
            Self::ScriptAttachment(record) => serde_json::to_value(record),
        };
        record.unwrap_or(Value::Null)
    }
}

/// The state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,

    /// Last time the state was written
    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    pub resources: BTreeMap<Address, StoredState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            last_updated: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

// ============================================================================
// StateFile Implementation
// ============================================================================

impl StateFile {
    /// State path for a manifest: `landscape.state.json` next to it.
    pub fn path_for(manifest: &Path) -> PathBuf {
        manifest
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(DEFAULT_STATE_FILE)
    }

    /// Load state from disk, or return empty state if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file {} does not exist, starting empty", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let state: StateFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version != STATE_VERSION {
            bail!(
                "State file {} has version {}, expected {STATE_VERSION}",
                path.display(),
                state.version
            );
        }
        for (address, stored) in &state.resources {
            if address.kind != stored.kind() {
                bail!(
                    "State file {}: {address} holds a {} record",
                    path.display(),
                    stored.kind()
                );
            }
        }

        log::debug!("Loaded {} instances from {}", state.resources.len(), path.display());
        Ok(state)
    }

    /// Stamp and write the state to disk
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();

        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;
        fs::write(path, content + "\n")
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&StoredState> {
        self.resources.get(address)
    }

    pub fn insert(&mut self, address: Address, stored: StoredState) {
        self.resources.insert(address, stored);
    }

    pub fn remove(&mut self, address: &Address) -> Option<StoredState> {
        self.resources.remove(address)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
