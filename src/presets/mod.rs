//! Local presets file describing agents, teams and topic themes.
//!
//! The file is JSON by default (`crewai-config.json`); a `.yaml` or
//! `.yml` extension switches to YAML. Sections this crate does not know
//! about are kept and written back on save.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::orchestration::{PlannedAgent, PlannedTask, TeamPlan};
use crate::types::agent::DEFAULT_LLM;
use crate::types::AgentSpec;

pub const DEFAULT_PRESETS_FILE: &str = "crewai-config.json";
pub const DEFAULT_THEME: &str = "default";

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown agent preset: {0}")]
    UnknownAgent(String),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Unknown topic theme: {0}")]
    UnknownTheme(String),

    #[error("Team '{team}' assigns a task to '{agent}', which is not a team member")]
    AgentNotInTeam { team: String, agent: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetFormat {
    Json,
    Yaml,
}

impl PresetFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Informational only; the client always uses its own configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    /// Keys this crate does not model, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPreset {
    pub name: String,
    pub role: String,
    #[serde(default = "default_llm")]
    pub llm: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default = "default_true")]
    pub verbose: bool,
    #[serde(default)]
    pub allow_delegation: bool,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub prompt_instructions: String,
    /// Keys this crate does not model, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPreset {
    pub agent: String,
    pub description: String,
    pub expected_output: String,
    /// Keys this crate does not model, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPreset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<TaskPreset>,
    /// Keys this crate does not model, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemePreset {
    pub focus: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tone: String,
    /// Keys this crate does not model, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_llm() -> String {
    DEFAULT_LLM.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presets {
    #[serde(default)]
    pub system: SystemInfo,
    #[serde(default)]
    pub agents: BTreeMap<String, AgentPreset>,
    #[serde(default)]
    pub teams: BTreeMap<String, TeamPreset>,
    #[serde(default)]
    pub topic_themes: BTreeMap<String, ThemePreset>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Presets {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PresetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let presets = Self::parse(&text, PresetFormat::from_path(path))?;
        tracing::debug!(
            path = %path.display(),
            agents = presets.agents.len(),
            teams = presets.teams.len(),
            themes = presets.topic_themes.len(),
            "presets loaded"
        );
        Ok(presets)
    }

    pub fn parse(text: &str, format: PresetFormat) -> Result<Self, PresetError> {
        Ok(match format {
            PresetFormat::Json => serde_json::from_str(text)?,
            PresetFormat::Yaml => serde_yaml::from_str(text)?,
        })
    }

    pub fn render(&self, format: PresetFormat) -> Result<String, PresetError> {
        Ok(match format {
            PresetFormat::Json => serde_json::to_string_pretty(self)?,
            PresetFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }

    /// Write the presets back, in the format implied by `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        let path = path.as_ref();
        let text = self.render(PresetFormat::from_path(path))?;
        std::fs::write(path, text).map_err(|source| PresetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "presets saved");
        Ok(())
    }

    /// Copy the current presets next to `path` as
    /// `<stem>-backup-<timestamp>.<ext>` and return the backup's path.
    pub fn backup(&self, path: impl AsRef<Path>) -> Result<PathBuf, PresetError> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("crewai-config");
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let target = path.with_file_name(format!("{}-backup-{}.{}", stem, stamp, ext));
        self.save(&target)?;
        Ok(target)
    }

    pub fn agent(&self, key: &str) -> Result<&AgentPreset, PresetError> {
        self.agents
            .get(key)
            .ok_or_else(|| PresetError::UnknownAgent(key.to_string()))
    }

    pub fn team(&self, key: &str) -> Result<&TeamPreset, PresetError> {
        self.teams
            .get(key)
            .ok_or_else(|| PresetError::UnknownTeam(key.to_string()))
    }

    pub fn theme(&self, key: &str) -> Result<&ThemePreset, PresetError> {
        self.topic_themes
            .get(key)
            .ok_or_else(|| PresetError::UnknownTheme(key.to_string()))
    }

    pub fn theme_names(&self) -> Vec<&str> {
        self.topic_themes.keys().map(String::as_str).collect()
    }

    /// Top-level section by name, as JSON.
    pub fn section(&self, name: &str) -> Result<Option<Value>, PresetError> {
        let mut value = serde_json::to_value(self)?;
        Ok(value.get_mut(name).map(Value::take))
    }

    /// Agent definition for `key`, with its prompt instructions folded
    /// into the backstory.
    pub fn agent_spec(&self, key: &str) -> Result<AgentSpec, PresetError> {
        let preset = self.agent(key)?;
        let mut backstory = preset.backstory.clone();
        if !preset.prompt_instructions.trim().is_empty() {
            backstory = format!("{}\n\nSpecial instructions: {}", backstory, preset.prompt_instructions);
        }
        let mut spec = AgentSpec::new(&preset.name, &preset.role, &preset.goal, backstory)
            .with_llm(&preset.llm)
            .with_tools(preset.tools.clone());
        spec.verbose = preset.verbose;
        spec.allow_delegation = preset.allow_delegation;
        Ok(spec)
    }

    /// Plan for `team`, with every task description tailored to `theme`
    /// and, when given, `topic`.
    pub fn team_plan(&self, team_key: &str, theme_key: &str, topic: Option<&str>) -> Result<TeamPlan, PresetError> {
        let team = self.team(team_key)?;
        let theme = self.theme(theme_key)?;

        let agents = team
            .agents
            .iter()
            .map(|key| {
                Ok(PlannedAgent {
                    key: key.clone(),
                    spec: self.agent_spec(key)?,
                })
            })
            .collect::<Result<Vec<_>, PresetError>>()?;

        let tasks = team
            .tasks
            .iter()
            .map(|task| {
                if !team.agents.contains(&task.agent) {
                    return Err(PresetError::AgentNotInTeam {
                        team: team_key.to_string(),
                        agent: task.agent.clone(),
                    });
                }
                Ok(PlannedTask {
                    agent_key: task.agent.clone(),
                    description: themed_description(&task.description, theme, topic),
                    expected_output: task.expected_output.clone(),
                })
            })
            .collect::<Result<Vec<_>, PresetError>>()?;

        Ok(TeamPlan {
            name: team.name.clone(),
            description: team.description.clone(),
            agents,
            tasks,
        })
    }

    /// Text rendering of what `team run` would do, without touching the
    /// studio.
    pub fn dry_run(&self, team_key: &str, theme_key: &str, topic: Option<&str>) -> Result<String, PresetError> {
        let plan = self.team_plan(team_key, theme_key, topic)?;
        let theme = self.theme(theme_key)?;

        let mut out = String::new();
        let _ = writeln!(out, "=== DRY RUN: {} ===", plan.name);
        if let Some(topic) = topic {
            let _ = writeln!(out, "Topic: {}", topic);
        }
        let _ = writeln!(out, "Theme: {} - {}", theme_key, theme.focus);
        let _ = writeln!(out, "\nWorkflow:");
        for (index, task) in self.team(team_key)?.tasks.iter().enumerate() {
            let agent = self.agent(&task.agent)?;
            let _ = writeln!(out, "{}. {} ({})", index + 1, agent.name, agent.llm);
            if !agent.tools.is_empty() {
                let _ = writeln!(out, "   Tools: {}", agent.tools.join(", "));
            }
            let _ = writeln!(out, "   Task: {}", task.description);
            let _ = writeln!(out, "   Expected output: {}", task.expected_output);
        }
        let _ = writeln!(out, "\nTheme:");
        let _ = writeln!(out, "- Focus: {}", theme.focus);
        let _ = writeln!(out, "- Keywords: {}", theme.keywords.join(", "));
        let _ = write!(out, "- Tone: {}", theme.tone);
        Ok(out)
    }

    /// Replace an agent's prompt instructions, returning the old ones.
    pub fn set_prompt_instructions(&mut self, key: &str, prompt: impl Into<String>) -> Result<String, PresetError> {
        let preset = self
            .agents
            .get_mut(key)
            .ok_or_else(|| PresetError::UnknownAgent(key.to_string()))?;
        Ok(std::mem::replace(&mut preset.prompt_instructions, prompt.into()))
    }

    /// A small, complete example to start a presets file from.
    pub fn template() -> Self {
        let mut presets = Self {
            system: SystemInfo {
                version: "2.1".to_string(),
                description: "Multi-agent content generation".to_string(),
                api_endpoint: Some(crate::config::DEFAULT_BASE_URL.to_string()),
                extra: Map::new(),
            },
            ..Self::default()
        };
        presets.agents.insert(
            "agent_template".to_string(),
            AgentPreset {
                name: "Agent Name".to_string(),
                role: "Agent role or title".to_string(),
                llm: DEFAULT_LLM.to_string(),
                goal: "What the agent should achieve".to_string(),
                backstory: "Background establishing the agent's expertise and personality".to_string(),
                verbose: true,
                allow_delegation: false,
                tools: vec!["search".to_string()],
                prompt_instructions: "How the agent should behave, what to prioritise, which style to use".to_string(),
                extra: Map::new(),
            },
        );
        presets.teams.insert(
            "team_template".to_string(),
            TeamPreset {
                name: "Team Name".to_string(),
                description: "Purpose and workflow of the team".to_string(),
                agents: vec!["agent_template".to_string()],
                tasks: vec![TaskPreset {
                    agent: "agent_template".to_string(),
                    description: "What the agent does in this step".to_string(),
                    expected_output: "What this step produces".to_string(),
                    extra: Map::new(),
                }],
                extra: Map::new(),
            },
        );
        presets.topic_themes.insert(
            DEFAULT_THEME.to_string(),
            ThemePreset {
                focus: "What this theme concentrates on".to_string(),
                keywords: vec!["keyword1".to_string(), "keyword2".to_string()],
                tone: "Desired tone and style".to_string(),
                extra: Map::new(),
            },
        );
        presets
    }

    pub fn write_template(path: impl AsRef<Path>) -> Result<(), PresetError> {
        Self::template().save(path)
    }
}

fn themed_description(description: &str, theme: &ThemePreset, topic: Option<&str>) -> String {
    let mut text = format!(
        "{}\n\nTheme focus: {}\nKeywords: {}\nTone: {}",
        description,
        theme.focus,
        theme.keywords.join(", "),
        theme.tone
    );
    if let Some(topic) = topic {
        text.push_str("\nTopic: ");
        text.push_str(topic);
    }
    text
}
