//! Subcommand handlers.

use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use serde_json::{Map, Value};

use super::printer::{ColoredText, PrinterColor};
use super::{
    AgentCommand, AgentCreateArgs, Cli, Command, CrewCommand, CrewCreateArgs, DeleteArgs, PresetCommand, Printer,
    RunArgs, TaskCommand, TeamCommand, TeamRewriteArgs, TeamRunArgs, ToolCommand,
};
use crate::client::StudioClient;
use crate::orchestration::{CrewAssembler, ResultSummary, TeamPlan};
use crate::presets::Presets;
use crate::types::{AgentSpec, CrewSpec, JobResult, ResourceId, RunStatus, TaskSpec};

pub async fn execute(cli: &Cli, printer: &Printer) -> anyhow::Result<()> {
    match &cli.cmd {
        Command::Status => status(cli, printer).await,
        Command::Agents(cmd) => agents(cli, cmd, printer).await,
        Command::Tasks(cmd) => tasks(cli, cmd, printer).await,
        Command::Crews(cmd) => crews(cli, cmd, printer).await,
        Command::Tools(ToolCommand::List) => tools(cli, printer).await,
        Command::Run(args) => run_crew(cli, args, printer).await,
        Command::Team(TeamCommand::Run(args)) => run_team(cli, args, printer).await,
        Command::Team(TeamCommand::Rewrite(args)) => rewrite_article(cli, args, printer).await,
        Command::Presets(cmd) => presets(cli, cmd, printer),
        Command::Config => show_config(cli, printer),
    }
}

fn client(cli: &Cli) -> anyhow::Result<StudioClient> {
    Ok(StudioClient::new(cli.studio_config()?)?)
}

fn load_presets(path: &Path) -> anyhow::Result<Presets> {
    Presets::load(path).with_context(|| format!("cannot load presets from {}", path.display()))
}

fn id_text(id: Option<&ResourceId>) -> String {
    id.map(ToString::to_string).unwrap_or_else(|| "-".to_string())
}

async fn status(cli: &Cli, printer: &Printer) -> anyhow::Result<()> {
    let client = client(cli)?;
    let response = client.check_status().await?;
    printer.success(format!("Connected to {}", client.config().base_url));
    if !response.is_null() {
        printer.json(&response)?;
    }
    Ok(())
}

async fn agents(cli: &Cli, cmd: &AgentCommand, printer: &Printer) -> anyhow::Result<()> {
    match cmd {
        AgentCommand::List => {
            let agents = client(cli)?.list_agents().await?;
            if agents.is_empty() {
                printer.warn("No agents found");
                return Ok(());
            }
            printer.heading(&format!("Agents ({})", agents.len()));
            for agent in &agents {
                printer.print_colored(&[
                    ColoredText::new(format!("{:>6}  ", id_text(agent.id.as_ref())), PrinterColor::Dim),
                    ColoredText::new(agent.label(), PrinterColor::Cyan),
                    ColoredText::new(
                        format!("  {}", agent.llm.as_deref().unwrap_or("default llm")),
                        PrinterColor::Dim,
                    ),
                ]);
            }
            Ok(())
        }
        AgentCommand::Create(args) => create_agent(cli, args, printer).await,
        AgentCommand::Delete(args) => {
            if !confirmed(args, "agent")? {
                printer.warn("Cancelled");
                return Ok(());
            }
            client(cli)?.delete_agent(&args.id).await?;
            printer.success(format!("Deleted agent {}", args.id));
            Ok(())
        }
    }
}

fn agent_spec(cli: &Cli, args: &AgentCreateArgs) -> anyhow::Result<AgentSpec> {
    let mut spec = match &args.preset {
        Some(key) => load_presets(&cli.presets)?.agent_spec(key)?,
        None => AgentSpec::new(
            args.name.clone().unwrap_or_default(),
            args.role.clone().unwrap_or_default(),
            args.goal.clone().unwrap_or_default(),
            args.backstory.clone().unwrap_or_default(),
        ),
    };
    if let Some(llm) = &args.llm {
        spec.llm = llm.clone();
    }
    if !args.tools.is_empty() {
        spec.tools = args.tools.clone();
    }
    if args.allow_delegation {
        spec.allow_delegation = true;
    }
    let missing = spec.missing_fields();
    if !missing.is_empty() {
        bail!("missing required agent fields: {} (or pass --preset)", missing.join(", "));
    }
    Ok(spec)
}

async fn create_agent(cli: &Cli, args: &AgentCreateArgs, printer: &Printer) -> anyhow::Result<()> {
    let spec = agent_spec(cli, args)?;
    let client = client(cli)?;
    if args.dry_run {
        printer.heading("Would create agent:");
        printer.json(&client.schema().agent_body(&spec))?;
        return Ok(());
    }
    let agent = client.create_agent(&spec).await?;
    printer.success(format!("Created agent {} ({})", id_text(agent.id.as_ref()), spec.name));
    Ok(())
}

async fn tasks(cli: &Cli, cmd: &TaskCommand, printer: &Printer) -> anyhow::Result<()> {
    let client = client(cli)?;
    match cmd {
        TaskCommand::List => {
            let tasks = client.list_tasks().await?;
            if tasks.is_empty() {
                printer.warn("No tasks found");
                return Ok(());
            }
            printer.heading(&format!("Tasks ({})", tasks.len()));
            for task in &tasks {
                printer.print_colored(&[
                    ColoredText::new(format!("{:>6}  ", id_text(task.id.as_ref())), PrinterColor::Dim),
                    ColoredText::new(first_line(&task.description), PrinterColor::Cyan),
                    ColoredText::new(format!("  agent {}", id_text(task.agent_id.as_ref())), PrinterColor::Dim),
                ]);
            }
        }
        TaskCommand::Create(args) => {
            let mut spec = TaskSpec::new(&args.description, &args.expected_output, args.agent_id.clone());
            spec.crew_id = args.crew_id.clone();
            let task = client.create_task(&spec).await?;
            printer.success(format!("Created task {}", id_text(task.id.as_ref())));
        }
    }
    Ok(())
}

async fn crews(cli: &Cli, cmd: &CrewCommand, printer: &Printer) -> anyhow::Result<()> {
    let client = client(cli)?;
    match cmd {
        CrewCommand::List => {
            let crews = client.list_crews().await?;
            if crews.is_empty() {
                printer.warn("No crews found");
                return Ok(());
            }
            printer.heading(&format!("Crews ({})", crews.len()));
            for crew in &crews {
                printer.print_colored(&[
                    ColoredText::new(format!("{:>6}  ", id_text(crew.id.as_ref())), PrinterColor::Dim),
                    ColoredText::new(crew.name.clone(), PrinterColor::Cyan),
                    ColoredText::new(
                        format!("  {} agents, {} tasks", crew.agent_ids.len(), crew.task_ids.len()),
                        PrinterColor::Dim,
                    ),
                ]);
            }
        }
        CrewCommand::Show { id } => {
            let crew = client.get_crew(id).await?;
            printer.json(&crew)?;
        }
        CrewCommand::Create(args) => create_crew(&client, args, printer).await?,
        CrewCommand::Attach(args) => {
            let crew = CrewAssembler::new(&client)
                .attach(&args.id, &args.agent_ids, &args.task_ids)
                .await?;
            printer.success(format!(
                "Crew {} has {} agents and {} tasks",
                args.id,
                crew.agent_ids.len(),
                crew.task_ids.len()
            ));
        }
        CrewCommand::Delete(args) => {
            if !confirmed(args, "crew")? {
                printer.warn("Cancelled");
                return Ok(());
            }
            client.delete_crew(&args.id).await?;
            printer.success(format!("Deleted crew {}", args.id));
        }
    }
    Ok(())
}

async fn create_crew(client: &StudioClient, args: &CrewCreateArgs, printer: &Printer) -> anyhow::Result<()> {
    let spec = CrewSpec::new(&args.name, &args.description).with_members(args.agent_ids.clone(), args.task_ids.clone());
    if args.dry_run {
        printer.heading("Would create crew:");
        printer.json(&client.schema().crew_body(&spec))?;
        return Ok(());
    }
    let crew = client.create_crew(&spec).await?;
    printer.success(format!("Created crew {} ({})", id_text(crew.id.as_ref()), args.name));
    Ok(())
}

async fn tools(cli: &Cli, printer: &Printer) -> anyhow::Result<()> {
    let tools = client(cli)?.list_tools().await?;
    if tools.is_empty() {
        printer.warn("No tools found");
        return Ok(());
    }
    printer.heading(&format!("Tools ({})", tools.len()));
    for tool in &tools {
        printer.print_colored(&[
            ColoredText::new(format!("  {}", tool.name), PrinterColor::Cyan),
            ColoredText::new(
                tool.description
                    .as_deref()
                    .map(|d| format!("  {}", first_line(d)))
                    .unwrap_or_default(),
                PrinterColor::Dim,
            ),
        ]);
    }
    Ok(())
}

async fn run_crew(cli: &Cli, args: &RunArgs, printer: &Printer) -> anyhow::Result<()> {
    let client = client(cli)?;
    let max_wait = max_wait(&client, args.max_wait);
    let inputs: Map<String, Value> = args
        .inputs
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();

    printer.info(format!("Running crew {} (waiting up to {}s)", args.crew_id, max_wait.as_secs()));
    let result = client
        .submit_and_await_with_inputs(&args.crew_id, &inputs, max_wait)
        .await?;
    report_result(&result, args.output.as_deref(), printer)
}

async fn run_team(cli: &Cli, args: &TeamRunArgs, printer: &Printer) -> anyhow::Result<()> {
    let presets = load_presets(&cli.presets)?;
    let topic = args.topic.as_deref();
    if args.dry_run {
        println!("{}", presets.dry_run(&args.team, &args.theme, topic)?);
        return Ok(());
    }

    let mut inputs = Map::new();
    if let Some(topic) = topic {
        inputs.insert("topic".to_string(), Value::String(topic.to_string()));
    }
    inputs.insert("theme".to_string(), Value::String(args.theme.clone()));
    for (key, value) in &args.inputs {
        inputs.insert(key.clone(), Value::String(value.clone()));
    }
    for (key, path) in &args.input_files {
        inputs.insert(key.clone(), Value::String(read_input(path)?));
    }

    let plan = presets.team_plan(&args.team, &args.theme, topic)?;
    launch_team(cli, plan, inputs, args.max_wait, args.output.as_deref(), printer).await
}

async fn rewrite_article(cli: &Cli, args: &TeamRewriteArgs, printer: &Printer) -> anyhow::Result<()> {
    let presets = load_presets(&cli.presets)?;
    let article = read_input(&args.file)?;
    if args.dry_run {
        println!("{}", presets.dry_run(&args.team, &args.theme, None)?);
        println!("Article: {} ({} chars)", args.file.display(), article.chars().count());
        return Ok(());
    }

    let mut inputs = Map::new();
    inputs.insert("article_content".to_string(), Value::String(article));
    let plan = presets.team_plan(&args.team, &args.theme, None)?;
    launch_team(cli, plan, inputs, args.max_wait, args.output.as_deref(), printer).await
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Assemble `plan` on the studio, run it with `inputs` and report.
async fn launch_team(
    cli: &Cli,
    plan: TeamPlan,
    inputs: Map<String, Value>,
    max_wait_secs: Option<u64>,
    output: Option<&Path>,
    printer: &Printer,
) -> anyhow::Result<()> {
    let client = client(cli)?;
    printer.info(format!(
        "Assembling '{}' ({} agents, {} tasks)",
        plan.name,
        plan.agents.len(),
        plan.tasks.len()
    ));
    let crew = CrewAssembler::new(&client).assemble(&plan).await?;
    printer.success(format!("Crew {} ready", crew.crew_id));

    let max_wait = max_wait(&client, max_wait_secs);
    let result = client
        .submit_and_await_with_inputs(&crew.crew_id, &inputs, max_wait)
        .await?;
    report_result(&result, output, printer)
}

fn max_wait(client: &StudioClient, secs: Option<u64>) -> Duration {
    secs.map(Duration::from_secs)
        .unwrap_or(client.config().default_max_wait)
}

fn report_result(result: &JobResult, output: Option<&Path>, printer: &Printer) -> anyhow::Result<()> {
    if result.status == RunStatus::Failed {
        bail!(
            "crew run {} failed: {}",
            result.job_id,
            result.error.as_deref().unwrap_or("no error message")
        );
    }

    printer.success(format!(
        "Run {} completed after {} status checks ({:.1}s)",
        result.job_id,
        result.polls,
        result.elapsed.as_secs_f64()
    ));
    for (name, text) in &result.results {
        printer.heading(&format!("\n## {}", name));
        println!("{}", text.trim());
    }
    if result.results.is_empty() {
        if let Some(text) = &result.output {
            println!("{}", text.trim());
        }
    }

    let summary = ResultSummary::from_result(result);
    printer.heading("\nSummary");
    println!("{}", summary);

    if let Some(path) = output {
        std::fs::write(path, result.combined_text()).with_context(|| format!("cannot write {}", path.display()))?;
        printer.success(format!("Saved output to {}", path.display()));
    }
    Ok(())
}

fn presets(cli: &Cli, cmd: &PresetCommand, printer: &Printer) -> anyhow::Result<()> {
    match cmd {
        PresetCommand::Themes => {
            let presets = load_presets(&cli.presets)?;
            printer.heading("Topic themes");
            for name in presets.theme_names() {
                let theme = presets.theme(name)?;
                printer.field(name, &theme.focus);
            }
        }
        PresetCommand::Show { section } => {
            let presets = load_presets(&cli.presets)?;
            match section {
                Some(name) => match presets.section(name)? {
                    Some(value) => printer.json(&value)?,
                    None => bail!("presets file has no '{}' section", name),
                },
                None => printer.json(&presets)?,
            }
        }
        PresetCommand::UpdatePrompt { agent, prompt, preview } => {
            let mut presets = load_presets(&cli.presets)?;
            let current = presets.agent(agent)?.prompt_instructions.clone();
            printer.field("current", if current.is_empty() { "(none)" } else { current.as_str() });
            printer.field("new", prompt);
            if *preview {
                return Ok(());
            }
            let backup = presets.backup(&cli.presets)?;
            presets.set_prompt_instructions(agent, prompt.clone())?;
            presets.save(&cli.presets)?;
            printer.success(format!(
                "Updated prompt for '{}' (backup at {})",
                agent,
                backup.display()
            ));
        }
        PresetCommand::Template { path } => {
            Presets::write_template(path)?;
            printer.success(format!("Template written to {}", path.display()));
        }
    }
    Ok(())
}

fn show_config(cli: &Cli, printer: &Printer) -> anyhow::Result<()> {
    let config = cli.studio_config()?;
    printer.heading("Configuration");
    printer.field("base_url", &config.base_url);
    printer.field("schema", config.schema);
    printer.field("request_timeout", format!("{}s", config.request_timeout.as_secs()));
    printer.field("poll_interval", format!("{:.1}s", config.poll_interval.as_secs_f64()));
    printer.field("max_poll_failures", config.max_poll_failures);
    printer.field("default_max_wait", format!("{}s", config.default_max_wait.as_secs()));
    printer.field("presets", cli.presets.display());
    Ok(())
}

fn confirmed(args: &DeleteArgs, kind: &str) -> anyhow::Result<bool> {
    if args.yes {
        return Ok(true);
    }
    let stdin = std::io::stdin();
    confirm(&format!("Delete {} {}?", kind, args.id), &mut stdin.lock())
}

/// Ask a yes/no question; anything but `y` or `yes` declines.
fn confirm(question: &str, input: &mut impl BufRead) -> anyhow::Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn first_line(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > 80 {
        format!("{}...", line.chars().take(77).collect::<String>())
    } else {
        line.to_string()
    }
}
