//! Studio resource types.
//!
//! The studio owns the lifecycle of every resource; these types only
//! mirror what it returns. Responses are decoded through [`Resource`],
//! which tolerates the alternate key names different deployments use.

pub mod agent;
pub mod crew;
pub mod ids;
pub mod run;
pub mod task;
pub mod tool;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub use agent::{Agent, AgentSpec};
pub use crew::{Crew, CrewSpec};
pub use ids::ResourceId;
pub use run::{JobResult, RunStatus};
pub use task::{Task, TaskSpec};
pub use tool::Tool;

/// A resource kind exposed by the studio under `/<LIST_KEY>`.
pub trait Resource: DeserializeOwned {
    /// Singular kind name used in messages ("agent", "crew", ...).
    const KIND: &'static str;
    /// Collection name, also the wrapper key of list responses.
    const LIST_KEY: &'static str;
    /// Keys that may carry the id, in order of preference.
    const ID_KEYS: &'static [&'static str];

    fn id(&self) -> Option<&ResourceId>;

    fn set_id(&mut self, id: ResourceId);

    /// Fill fields whose key differs between deployments.
    fn absorb_aliases(&mut self, _raw: &Value) {}

    /// Decode a resource from a studio response.
    fn from_json(raw: Value) -> Result<Self, serde_json::Error> {
        let mut resource: Self = serde_json::from_value(raw.clone())?;
        if resource.id().is_none() {
            if let Some(id) = ResourceId::from_keys(&raw, Self::ID_KEYS) {
                resource.set_id(id);
            }
        }
        resource.absorb_aliases(&raw);
        Ok(resource)
    }
}

/// Normalize a list response.
///
/// Accepts either a bare array or an object wrapping the array under
/// `list_key`. Anything else yields an empty list.
pub fn normalize_list(value: Value, list_key: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(list_key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Field deserializer that reads `null` or a value of the wrong type as
/// the field's default.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|value| T::deserialize(value).ok())
        .unwrap_or_default())
}

/// First non-empty string among `keys`.
pub(crate) fn string_from_keys(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Names from an array of strings or of objects with a `name` field.
pub(crate) fn names_from_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("name").and_then(Value::as_str).map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default()
}
