//! # crewctl
//!
//! Client and command-line tool for a CrewAI Studio deployment.
//!
//! The studio runs the agents; this crate only talks to it over HTTP:
//! it manages agent, task and crew resources, submits crew runs and
//! polls them at a fixed interval until they finish or time out.
//!
//! ```no_run
//! use crewctl::{StudioClient, StudioConfig, ResourceId};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = StudioClient::new(StudioConfig::from_env()?)?;
//! let wait = client.config().default_max_wait;
//! let result = client.submit_and_await(&ResourceId::from("C1"), wait).await?;
//! println!("{}", result.combined_text());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod orchestration;
pub mod presets;
pub mod types;

pub use client::{ApiResult, ApiSchema, HttpMethod, OrchestrationApiError, PollingConfig, StudioClient};
pub use config::{ConfigError, StudioConfig};
pub use orchestration::{AssembledCrew, AssemblyError, CrewAssembler, ResultSummary, TeamPlan};
pub use presets::{PresetError, Presets};
pub use types::{Agent, AgentSpec, Crew, CrewSpec, JobResult, ResourceId, RunStatus, Task, TaskSpec, Tool};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
