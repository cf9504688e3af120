//! Crew resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::ids_from_array;
use super::{lenient, Resource, ResourceId};

/// A crew as returned by the studio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Crew {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<ResourceId>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    /// Member agents, from `agent_ids` or `agents`.
    #[serde(default, skip_deserializing)]
    pub agent_ids: Vec<ResourceId>,
    /// Member tasks, from `task_ids` or `tasks`.
    #[serde(default, skip_deserializing)]
    pub task_ids: Vec<ResourceId>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub memory: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub manager_agent_id: Option<ResourceId>,
}

impl Crew {
    /// Whether the crew carries exactly the given members, in any order.
    pub fn has_members(&self, agent_ids: &[ResourceId], task_ids: &[ResourceId]) -> bool {
        fn same(a: &[ResourceId], b: &[ResourceId]) -> bool {
            let mut a = a.to_vec();
            let mut b = b.to_vec();
            a.sort();
            b.sort();
            a == b
        }
        same(&self.agent_ids, agent_ids) && same(&self.task_ids, task_ids)
    }
}

impl Resource for Crew {
    const KIND: &'static str = "crew";
    const LIST_KEY: &'static str = "crews";
    const ID_KEYS: &'static [&'static str] = &["id", "crew_id"];

    fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = Some(id);
    }

    fn absorb_aliases(&mut self, raw: &Value) {
        self.agent_ids = ids_from_array(raw.get("agent_ids"), &["id", "agent_id"]);
        if self.agent_ids.is_empty() {
            self.agent_ids = ids_from_array(raw.get("agents"), &["id", "agent_id"]);
        }
        self.task_ids = ids_from_array(raw.get("task_ids"), &["id", "task_id"]);
        if self.task_ids.is_empty() {
            self.task_ids = ids_from_array(raw.get("tasks"), &["id", "task_id"]);
        }
    }
}

/// Definition of a crew to create or re-associate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub agent_ids: Vec<ResourceId>,
    #[serde(default)]
    pub task_ids: Vec<ResourceId>,
    #[serde(default = "default_process")]
    pub process: String,
    #[serde(default = "default_true")]
    pub verbose: bool,
    #[serde(default)]
    pub memory: bool,
    #[serde(default = "default_true")]
    pub cache: bool,
}

fn default_process() -> String {
    "sequential".to_string()
}

fn default_true() -> bool {
    true
}

impl CrewSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent_ids: Vec::new(),
            task_ids: Vec::new(),
            process: default_process(),
            verbose: true,
            memory: false,
            cache: true,
        }
    }

    pub fn with_members(mut self, agent_ids: Vec<ResourceId>, task_ids: Vec<ResourceId>) -> Self {
        self.agent_ids = agent_ids;
        self.task_ids = task_ids;
        self
    }

    /// Spec for re-associating an existing crew, keeping its settings.
    pub fn from_existing(crew: &Crew, agent_ids: Vec<ResourceId>, task_ids: Vec<ResourceId>) -> Self {
        Self {
            name: crew.name.clone(),
            description: crew.description.clone().unwrap_or_default(),
            agent_ids,
            task_ids,
            process: crew.process.clone().unwrap_or_else(default_process),
            verbose: crew.verbose.unwrap_or(true),
            memory: crew.memory.unwrap_or(false),
            cache: crew.cache.unwrap_or(true),
        }
    }
}
