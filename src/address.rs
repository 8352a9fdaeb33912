//! Resource kinds and instance addresses.
//!
//! An address is `<kind>.<name>`, e.g. `script_v2.deploy` or
//! `script_attachment.deploy_env`. The name is the key the manifest uses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kinds of managed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// Either script generation, chosen by `script_type`.
    Script,
    /// Legacy scripts only.
    ScriptV1,
    /// Modern scripts only.
    ScriptV2,
    /// A single attachment on a script.
    ScriptAttachment,
}

impl Kind {
    pub const ALL: [Kind; 4] = [
        Kind::Script,
        Kind::ScriptV1,
        Kind::ScriptV2,
        Kind::ScriptAttachment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Script => "script",
            Kind::ScriptV1 => "script_v1",
            Kind::ScriptV2 => "script_v2",
            Kind::ScriptAttachment => "script_attachment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    pub fn is_script(&self) -> bool {
        !matches!(self, Kind::ScriptAttachment)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A managed instance: kind plus manifest name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    pub kind: Kind,
    pub name: String,
}

impl Address {
    pub fn new(kind: Kind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, name) = s
            .split_once('.')
            .ok_or_else(|| format!("'{s}' is not an address (expected <kind>.<name>)"))?;
        let kind = Kind::parse(kind).ok_or_else(|| {
            let known: Vec<_> = Kind::ALL.iter().map(Kind::as_str).collect();
            format!("unknown kind '{kind}' (expected one of: {})", known.join(", "))
        })?;
        if name.is_empty() {
            return Err(format!("'{s}' has an empty name"));
        }
        Ok(Self::new(kind, name))
    }
}

impl TryFrom<String> for Address {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let address: Address = "script_v2.deploy".parse().unwrap();
        assert_eq!(address, Address::new(Kind::ScriptV2, "deploy"));
        assert_eq!(address.to_string(), "script_v2.deploy");

        // Names may contain dots; only the first one splits.
        let dotted: Address = "script_attachment.env.prod".parse().unwrap();
        assert_eq!(dotted.name, "env.prod");
    }

    #[test]
    fn test_parse_errors() {
        assert!("deploy".parse::<Address>().is_err());
        assert!("script.".parse::<Address>().is_err());
        let err = "job.deploy".parse::<Address>().unwrap_err();
        assert!(err.contains("script_attachment"));
    }

    #[test]
    fn test_serde_as_string_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(Address::new(Kind::Script, "a"), 1);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"script.a":1}"#);

        let back: std::collections::BTreeMap<Address, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
