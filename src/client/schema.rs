//! Request shapes pinned per studio deployment.
//!
//! Two API generations are in the field. A deployment speaks exactly
//! one of them and the client is configured accordingly; it never
//! probes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{AgentSpec, CrewSpec, ResourceId, TaskSpec};

/// API generation spoken by a studio deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiSchema {
    /// `POST /runs`, `GET /runs/{id}`.
    #[default]
    Runs,
    /// `POST /execute` with a `run_crew` command, `GET /status/{id}`.
    Execute,
}

impl ApiSchema {
    /// Endpoint that starts a crew run.
    pub fn submit_path(&self) -> &'static str {
        match self {
            Self::Runs => "/runs",
            Self::Execute => "/execute",
        }
    }

    /// Body that starts a run of `crew_id`.
    pub fn submit_body(&self, crew_id: &ResourceId, inputs: &Map<String, Value>) -> Value {
        match self {
            Self::Runs => json!({
                "crew_id": crew_id.to_json(),
                "inputs": inputs,
            }),
            Self::Execute => {
                let mut body = json!({
                    "command": "run_crew",
                    "crew_id": crew_id.to_json(),
                });
                if !inputs.is_empty() {
                    body["args"] = json!({ "inputs": inputs });
                }
                body
            }
        }
    }

    /// Key under which the submit response carries the job id.
    pub fn job_id_key(&self) -> &'static str {
        match self {
            Self::Runs => "id",
            Self::Execute => "task_id",
        }
    }

    /// Endpoint reporting the state of job `job_id`.
    pub fn status_path(&self, job_id: &ResourceId) -> String {
        match self {
            Self::Runs => format!("/runs/{}", job_id),
            Self::Execute => format!("/status/{}", job_id),
        }
    }

    /// Body that creates an agent.
    pub fn agent_body(&self, spec: &AgentSpec) -> Value {
        let llm_key = match self {
            Self::Runs => "llm_provider_model",
            Self::Execute => "llm",
        };
        let mut body = json!({
            "name": spec.name,
            "role": spec.role,
            "goal": spec.goal,
            "backstory": spec.backstory,
            "verbose": spec.verbose,
            "allow_delegation": spec.allow_delegation,
            "tools": spec.tools,
        });
        body[llm_key] = Value::String(spec.llm.clone());
        body
    }

    /// Body that creates a task.
    pub fn task_body(&self, spec: &TaskSpec) -> Value {
        let mut body = json!({
            "description": spec.description,
            "expected_output": spec.expected_output,
            "agent_id": spec.agent_id.to_json(),
        });
        match self {
            Self::Runs => {
                body["async_execution"] = Value::Bool(false);
            }
            Self::Execute => {
                if let Some(crew_id) = &spec.crew_id {
                    body["crew_id"] = crew_id.to_json();
                }
            }
        }
        body
    }

    /// Body that creates a crew or replaces its associations.
    pub fn crew_body(&self, spec: &CrewSpec) -> Value {
        let ids = |ids: &[ResourceId]| ids.iter().map(ResourceId::to_json).collect::<Vec<_>>();
        match self {
            Self::Runs => json!({
                "name": spec.name,
                "description": spec.description,
                "process": spec.process,
                "verbose": spec.verbose,
                "memory": spec.memory,
                "cache": spec.cache,
                "agent_ids": ids(&spec.agent_ids),
                "task_ids": ids(&spec.task_ids),
            }),
            Self::Execute => json!({
                "name": spec.name,
                "description": spec.description,
                "agent_ids": ids(&spec.agent_ids),
                "task_ids": ids(&spec.task_ids),
            }),
        }
    }
}

impl fmt::Display for ApiSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runs => write!(f, "runs"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

impl FromStr for ApiSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "runs" | "v2" => Ok(Self::Runs),
            "execute" | "v1" => Ok(Self::Execute),
            other => Err(format!("unknown API schema '{}', expected 'runs' or 'execute'", other)),
        }
    }
}
