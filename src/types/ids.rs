//! Resource identifiers as issued by the studio.
//!
//! Older deployments hand out integer ids, newer ones prefixed strings
//! such as `C_4f1a`. Both are kept exactly as received so they can be
//! sent back in the same JSON shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of an agent, task, crew or run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Numeric(i64),
    Text(String),
}

impl ResourceId {
    /// Read an id from the first of `keys` present on a JSON object.
    ///
    /// Empty strings and non-scalar values are skipped.
    pub fn from_keys(value: &Value, keys: &[&str]) -> Option<Self> {
        keys.iter()
            .filter_map(|key| value.get(*key))
            .find_map(Self::from_value)
    }

    /// Interpret a single JSON scalar as an id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Numeric),
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// JSON representation used in request bodies.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Numeric(n) => Value::from(*n),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Canonical integers become `Numeric`; anything that would not print
/// back identically (`007`, `+5`) stays text.
impl FromStr for ResourceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => Self::Numeric(n),
            _ => Self::Text(s.to_string()),
        })
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for ResourceId {
    fn from(n: i64) -> Self {
        Self::Numeric(n)
    }
}

/// Collect ids from a JSON array whose items are either bare ids or
/// objects carrying one of `keys`.
pub(crate) fn ids_from_array(value: Option<&Value>, keys: &[&str]) -> Vec<ResourceId> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    ResourceId::from_value(item).or_else(|| ResourceId::from_keys(item, keys))
                })
                .collect()
        })
        .unwrap_or_default()
}
