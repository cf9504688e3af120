use serde::{Deserialize, Serialize};

use super::{lenient, Resource, ResourceId};

/// A tool the studio can attach to agents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tool {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<ResourceId>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
}

impl Resource for Tool {
    const KIND: &'static str = "tool";
    const LIST_KEY: &'static str = "tools";
    const ID_KEYS: &'static [&'static str] = &["id", "tool_id"];

    fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: ResourceId) {
        self.id = Some(id);
    }
}
