//! Builds a complete crew on the studio from a [`TeamPlan`].
//!
//! Agents are created first, then one task per plan step bound to its
//! agent, then the crew carrying every id. Some deployments drop the
//! associations on create, so the crew is read back and re-associated
//! with `PUT /crews/{id}` when they are missing.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::client::{OrchestrationApiError, StudioClient};
use crate::types::{AgentSpec, Crew, CrewSpec, Resource, ResourceId, TaskSpec};

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Api(#[from] OrchestrationApiError),

    #[error("Studio returned no id for {kind} '{label}'")]
    MissingId { kind: &'static str, label: String },

    #[error("Task {step} is assigned to '{agent}', which is not part of the plan")]
    UnknownAgent { step: usize, agent: String },

    #[error("Crew {crew_id} did not keep its agent and task associations")]
    AssociationsNotPersisted { crew_id: ResourceId },
}

/// An agent to create, keyed by its name within the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedAgent {
    pub key: String,
    pub spec: AgentSpec,
}

/// One step of the workflow, performed by the agent named `agent_key`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedTask {
    pub agent_key: String,
    pub description: String,
    pub expected_output: String,
}

/// Everything needed to stand up a crew.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPlan {
    pub name: String,
    pub description: String,
    pub agents: Vec<PlannedAgent>,
    pub tasks: Vec<PlannedTask>,
}

impl TeamPlan {
    /// Check every task points at an agent of the plan.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        for (index, task) in self.tasks.iter().enumerate() {
            if !self.agents.iter().any(|agent| agent.key == task.agent_key) {
                return Err(AssemblyError::UnknownAgent {
                    step: index + 1,
                    agent: task.agent_key.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Ids of a crew created by [`CrewAssembler::assemble`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledCrew {
    pub crew_id: ResourceId,
    pub agent_ids: Vec<ResourceId>,
    pub task_ids: Vec<ResourceId>,
}

pub struct CrewAssembler<'a> {
    client: &'a StudioClient,
}

impl<'a> CrewAssembler<'a> {
    pub fn new(client: &'a StudioClient) -> Self {
        Self { client }
    }

    pub async fn assemble(&self, plan: &TeamPlan) -> Result<AssembledCrew, AssemblyError> {
        plan.validate()?;

        let mut by_key: HashMap<&str, ResourceId> = HashMap::new();
        let mut agent_ids = Vec::with_capacity(plan.agents.len());
        for planned in &plan.agents {
            let agent = self.client.create_agent(&planned.spec).await?;
            let id = required_id(agent.id(), "agent", &planned.spec.name)?;
            tracing::info!(agent = %planned.key, id = %id, "agent created");
            by_key.insert(planned.key.as_str(), id.clone());
            agent_ids.push(id);
        }

        let mut task_ids = Vec::with_capacity(plan.tasks.len());
        for (index, planned) in plan.tasks.iter().enumerate() {
            let agent_id = by_key
                .get(planned.agent_key.as_str())
                .cloned()
                .ok_or_else(|| AssemblyError::UnknownAgent {
                    step: index + 1,
                    agent: planned.agent_key.clone(),
                })?;
            let spec = TaskSpec::new(&planned.description, &planned.expected_output, agent_id);
            let task = self.client.create_task(&spec).await?;
            let id = required_id(task.id(), "task", &format!("step {}", index + 1))?;
            tracing::debug!(task = %id, agent = %planned.agent_key, "task created");
            task_ids.push(id);
        }

        let spec = CrewSpec::new(&plan.name, &plan.description)
            .with_members(agent_ids.clone(), task_ids.clone());
        let crew = self.client.create_crew(&spec).await?;
        let crew_id = required_id(crew.id(), "crew", &plan.name)?;
        tracing::info!(crew = %crew_id, agents = agent_ids.len(), tasks = task_ids.len(), "crew created");

        self.attach(&crew_id, &agent_ids, &task_ids).await?;

        Ok(AssembledCrew {
            crew_id,
            agent_ids,
            task_ids,
        })
    }

    /// Make sure the crew carries exactly the given agents and tasks,
    /// re-associating it once if it does not.
    pub async fn attach(
        &self,
        crew_id: &ResourceId,
        agent_ids: &[ResourceId],
        task_ids: &[ResourceId],
    ) -> Result<Crew, AssemblyError> {
        let crew = self.client.get_crew(crew_id).await?;
        if crew.has_members(agent_ids, task_ids) {
            return Ok(crew);
        }

        tracing::warn!(crew = %crew_id, "crew associations missing, updating crew");
        let spec = CrewSpec::from_existing(&crew, agent_ids.to_vec(), task_ids.to_vec());
        self.client.update_crew(crew_id, &spec).await?;

        let crew = self.client.get_crew(crew_id).await?;
        if crew.has_members(agent_ids, task_ids) {
            Ok(crew)
        } else {
            Err(AssemblyError::AssociationsNotPersisted {
                crew_id: crew_id.clone(),
            })
        }
    }
}

fn required_id(id: Option<&ResourceId>, kind: &'static str, label: &str) -> Result<ResourceId, AssemblyError> {
    id.cloned().ok_or_else(|| AssemblyError::MissingId {
        kind,
        label: label.to_string(),
    })
}
