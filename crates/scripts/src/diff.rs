//! Attribute-level differences between two records.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

/// One attribute that differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    /// Attribute name.
    pub attribute: String,
    /// Value before (JSON, `null` when absent).
    pub before: Value,
    /// Value after.
    pub after: Value,
}

impl AttributeChange {
    /// Both sides as text, when both are strings.
    pub fn as_text(&self) -> Option<(&str, &str)> {
        Some((self.before.as_str()?, self.after.as_str()?))
    }
}

/// Compare two records attribute by attribute, in name order.
///
/// Records that fail to serialize are treated as empty objects.
pub fn diff_records<T: Serialize>(before: &T, after: &T) -> Vec<AttributeChange> {
    let before = top_level(before);
    let after = top_level(after);

    let names: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    names
        .into_iter()
        .filter_map(|name| {
            let old = before.get(name).cloned().unwrap_or(Value::Null);
            let new = after.get(name).cloned().unwrap_or(Value::Null);
            (old != new).then(|| AttributeChange {
                attribute: name.clone(),
                before: old,
                after: new,
            })
        })
        .collect()
}

fn top_level<T: Serialize>(record: &T) -> serde_json::Map<String, Value> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}
