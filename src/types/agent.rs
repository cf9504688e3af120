//! Agent resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{lenient, names_from_array, string_from_keys, Resource, ResourceId};

/// An agent as returned by the studio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<ResourceId>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient")]
    pub goal: String,
    #[serde(default, deserialize_with = "lenient")]
    pub backstory: String,
    /// Model identifier, read from whichever key the deployment uses.
    #[serde(default, skip_deserializing)]
    pub llm: Option<String>,
    #[serde(default, skip_deserializing)]
    pub tools: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub allow_delegation: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub verbose: bool,
}

impl Agent {
    /// Display label: the name if set, otherwise the role.
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.role,
        }
    }
}

impl Resource for Agent {
    const KIND: &'static str = "agent";
    const LIST_KEY: &'static str = "agents";
    const ID_KEYS: &'static [&'static str] = &["id", "agent_id"];

    fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = Some(id);
    }

    fn absorb_aliases(&mut self, raw: &Value) {
        self.llm = string_from_keys(raw, &["llm", "llm_provider_model", "llm_model"]);
        self.tools = names_from_array(raw.get("tools"));
    }
}

/// Definition of an agent to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub llm: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default)]
    pub allow_delegation: bool,
}

fn default_verbose() -> bool {
    true
}

/// Model used when neither a preset nor the operator names one.
pub const DEFAULT_LLM: &str = "gpt-4";

impl AgentSpec {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            llm: DEFAULT_LLM.to_string(),
            tools: Vec::new(),
            verbose: true,
            allow_delegation: false,
        }
    }

    pub fn with_llm(mut self, llm: impl Into<String>) -> Self {
        self.llm = llm.into();
        self
    }

    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    /// Names of the required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("role", &self.role),
            ("goal", &self.goal),
            ("backstory", &self.backstory),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_agent_reads_alternate_keys() {
        let raw = json!({
            "agent_id": "A_9",
            "role": "Editor",
            "llm_provider_model": "openai:gpt-4o-mini",
            "tools": [{"name": "search"}, "file_search"]
        });
        let agent = Agent::from_json(raw).unwrap();
        assert_eq!(agent.id, Some(ResourceId::from("A_9")));
        assert_eq!(agent.llm.as_deref(), Some("openai:gpt-4o-mini"));
        assert_eq!(agent.tools, vec!["search", "file_search"]);
        assert_eq!(agent.label(), "Editor");
    }

    #[test]
    fn test_primary_id_wins_over_alias() {
        let agent = Agent::from_json(json!({"id": 4, "agent_id": 5, "name": "Macro"})).unwrap();
        assert_eq!(agent.id, Some(ResourceId::Numeric(4)));
        assert_eq!(agent.label(), "Macro");
    }

    #[test]
    fn test_spec_missing_fields() {
        let spec = AgentSpec::new("n", "", "g", " ");
        assert_eq!(spec.missing_fields(), vec!["role", "backstory"]);
        assert_eq!(spec.llm, DEFAULT_LLM);
    }
}
