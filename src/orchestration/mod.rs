//! Multi-step workflows built on top of [`StudioClient`](crate::client::StudioClient).

pub mod assembler;
pub mod summary;

pub use assembler::{AssembledCrew, AssemblyError, CrewAssembler, PlannedAgent, PlannedTask, TeamPlan};
pub use summary::{ContentGrade, ResultSummary, SectionSize};
