//! Task resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{lenient, Resource, ResourceId};

/// A task as returned by the studio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<ResourceId>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub expected_output: String,
    #[serde(default, skip_deserializing)]
    pub agent_id: Option<ResourceId>,
}

impl Resource for Task {
    const KIND: &'static str = "task";
    const LIST_KEY: &'static str = "tasks";
    const ID_KEYS: &'static [&'static str] = &["id", "task_id"];

    fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = Some(id);
    }

    fn absorb_aliases(&mut self, raw: &Value) {
        self.agent_id = ResourceId::from_keys(raw, &["agent_id"]).or_else(|| {
            raw.get("agent").and_then(|agent| {
                ResourceId::from_value(agent).or_else(|| ResourceId::from_keys(agent, &["id"]))
            })
        });
    }
}

/// Definition of a task to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub description: String,
    pub expected_output: String,
    pub agent_id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crew_id: Option<ResourceId>,
}

impl TaskSpec {
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent_id: ResourceId,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent_id,
            crew_id: None,
        }
    }
}
