//! `crewctl` command-line interface.
//!
//! Every subcommand runs through [`run`], which turns any failure into a
//! single `API Error: ...` or `Error: ...` line and a non-zero exit code.

pub mod commands;
pub mod printer;

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::client::{ApiSchema, OrchestrationApiError};
use crate::config::StudioConfig;
use crate::orchestration::AssemblyError;
use crate::presets::DEFAULT_PRESETS_FILE;
use crate::types::ResourceId;

pub use printer::Printer;

#[derive(Parser, Debug)]
#[command(name = "crewctl", version, about = "Manage agents, tasks and crews on a CrewAI Studio deployment")]
pub struct Cli {
    /// Studio base URL, overrides CREWAI_BASE_URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds, overrides CREWAI_TIMEOUT
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Seconds between status checks, overrides CREWAI_POLL_INTERVAL
    #[arg(long, global = true, value_name = "SECS")]
    pub poll_interval: Option<f64>,

    /// API generation of the deployment: runs or execute
    #[arg(long, global = true)]
    pub schema: Option<ApiSchema>,

    /// Presets file with agent, team and theme definitions
    #[arg(long, global = true, env = "CREWAI_PRESETS", default_value = DEFAULT_PRESETS_FILE)]
    pub presets: PathBuf,

    /// Log every request
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Variables read instead of the process environment when set.
    #[arg(skip)]
    pub env: Option<HashMap<String, String>>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the studio answers
    Status,
    #[command(subcommand)]
    Agents(AgentCommand),
    #[command(subcommand)]
    Tasks(TaskCommand),
    #[command(subcommand)]
    Crews(CrewCommand),
    #[command(subcommand)]
    Tools(ToolCommand),
    /// Run a crew and wait for its result
    Run(RunArgs),
    #[command(subcommand)]
    Team(TeamCommand),
    #[command(subcommand)]
    Presets(PresetCommand),
    /// Show the effective configuration
    Config,
}

#[derive(Subcommand, Debug)]
pub enum AgentCommand {
    List,
    Create(AgentCreateArgs),
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct AgentCreateArgs {
    /// Agent key in the presets file
    #[arg(long, conflicts_with_all = ["name", "role", "goal", "backstory"])]
    pub preset: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub role: Option<String>,

    #[arg(long)]
    pub goal: Option<String>,

    #[arg(long)]
    pub backstory: Option<String>,

    #[arg(long)]
    pub llm: Option<String>,

    /// Tool name; can be given multiple times
    #[arg(long = "tool", value_name = "TOOL")]
    pub tools: Vec<String>,

    #[arg(long)]
    pub allow_delegation: bool,

    /// Print the request body instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[arg(value_parser = parse_id)]
    pub id: ResourceId,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    List,
    Create(TaskCreateArgs),
}

#[derive(Args, Debug)]
pub struct TaskCreateArgs {
    #[arg(long)]
    pub description: String,

    #[arg(long)]
    pub expected_output: String,

    #[arg(long, value_parser = parse_id)]
    pub agent_id: ResourceId,

    #[arg(long, value_parser = parse_id)]
    pub crew_id: Option<ResourceId>,
}

#[derive(Subcommand, Debug)]
pub enum CrewCommand {
    List,
    Show {
        #[arg(value_parser = parse_id)]
        id: ResourceId,
    },
    Create(CrewCreateArgs),
    /// Associate agents and tasks with an existing crew
    Attach(CrewAttachArgs),
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct CrewCreateArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long = "agent-id", value_name = "ID", required = true, value_parser = parse_id)]
    pub agent_ids: Vec<ResourceId>,

    #[arg(long = "task-id", value_name = "ID", value_parser = parse_id)]
    pub task_ids: Vec<ResourceId>,

    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct CrewAttachArgs {
    #[arg(value_parser = parse_id)]
    pub id: ResourceId,

    #[arg(long = "agent-id", value_name = "ID", required = true, value_parser = parse_id)]
    pub agent_ids: Vec<ResourceId>,

    #[arg(long = "task-id", value_name = "ID", required = true, value_parser = parse_id)]
    pub task_ids: Vec<ResourceId>,
}

#[derive(Subcommand, Debug)]
pub enum ToolCommand {
    List,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(value_parser = parse_id)]
    pub crew_id: ResourceId,

    /// Seconds to wait before giving up, overrides CREWAI_MAX_WAIT
    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    /// Run input as key=value; can be given multiple times
    #[arg(long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,

    /// Write the generated text to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum TeamCommand {
    /// Build a team from the presets file and run it
    Run(TeamRunArgs),
    /// Improve an existing article with a rewrite team
    Rewrite(TeamRewriteArgs),
}

#[derive(Args, Debug)]
pub struct TeamRunArgs {
    pub team: String,

    #[arg(long, default_value = crate::presets::DEFAULT_THEME)]
    pub theme: String,

    #[arg(long)]
    pub topic: Option<String>,

    /// Run input as key=value; can be given multiple times
    #[arg(long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,

    /// Run input read from a file, as key=path
    #[arg(long = "input-file", value_name = "KEY=PATH", value_parser = parse_input_file)]
    pub input_files: Vec<(String, PathBuf)>,

    /// Describe the workflow without touching the studio
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TeamRewriteArgs {
    /// Article to improve, sent as the `article_content` input
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,

    #[arg(long, default_value = REWRITE_TEAM)]
    pub team: String,

    #[arg(long, default_value = crate::presets::DEFAULT_THEME)]
    pub theme: String,

    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Team used by `team rewrite` unless another is named.
pub const REWRITE_TEAM: &str = "article_rewrite";

#[derive(Subcommand, Debug)]
pub enum PresetCommand {
    /// List topic themes
    Themes,
    /// Print the presets file or one of its sections
    Show {
        #[arg(long)]
        section: Option<String>,
    },
    /// Replace an agent's prompt instructions
    UpdatePrompt {
        #[arg(long)]
        agent: String,

        #[arg(long)]
        prompt: String,

        /// Show the change without saving it
        #[arg(long)]
        preview: bool,
    },
    /// Write a starter presets file
    Template {
        #[arg(long, default_value = "crewai-config-template.json")]
        path: PathBuf,
    },
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn parse_input_file(raw: &str) -> Result<(String, PathBuf), String> {
    match parse_input(raw)? {
        (_, path) if path.is_empty() => Err(format!("expected KEY=PATH, got '{}'", raw)),
        (key, path) => Ok((key, PathBuf::from(path))),
    }
}

fn parse_id(raw: &str) -> Result<ResourceId, String> {
    if raw.trim().is_empty() {
        return Err("id must not be empty".to_string());
    }
    raw.parse().map_err(|never: std::convert::Infallible| match never {})
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    pub fn studio_config(&self) -> anyhow::Result<StudioConfig> {
        let config = match &self.env {
            Some(vars) => StudioConfig::from_lookup(|key| vars.get(key).cloned()),
            None => StudioConfig::from_env(),
        };
        let mut config = config.context("invalid CREWAI_* environment")?;
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(secs) = self.timeout {
            anyhow::ensure!(secs > 0, "--timeout must be greater than zero");
            config = config.with_request_timeout(std::time::Duration::from_secs(secs));
        }
        if let Some(secs) = self.poll_interval {
            anyhow::ensure!(secs.is_finite() && secs > 0.0, "--poll-interval must be a positive number");
            let interval =
                std::time::Duration::try_from_secs_f64(secs).context("--poll-interval is out of range")?;
            config = config.with_poll_interval(interval);
        }
        if let Some(schema) = self.schema {
            config = config.with_schema(schema);
        }
        Ok(config)
    }
}

/// Run the parsed command line, reporting any failure on stderr.
pub async fn run(cli: Cli) -> ExitCode {
    let printer = Printer::new();
    match commands::execute(&cli, &printer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            printer.error(error_message(&err));
            ExitCode::FAILURE
        }
    }
}

/// One-line description of a failed command.
pub fn error_message(err: &anyhow::Error) -> String {
    let api = err.downcast_ref::<OrchestrationApiError>().or_else(|| {
        match err.downcast_ref::<AssemblyError>() {
            Some(AssemblyError::Api(api)) => Some(api),
            _ => None,
        }
    });
    match api {
        Some(api) => format!("API Error: {}", api),
        None => format!("Error: {:#}", err),
    }
}
