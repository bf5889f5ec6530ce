//! AutoEvolver - objective feasibility and task decomposition
//!
//! CLI entry point for interactive sessions, one-shot planning, and chat.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use autoevolver::chat::ChatSession;
use autoevolver::cli::{Cli, Command, OutputFormat, get_log_path};
use autoevolver::config::Config;
use autoevolver::domain::Objective;
use autoevolver::planning::{Assessment, PlanningError};
use autoevolver::presenter::Console;
use autoevolver::prompts::PromptLoader;
use autoevolver::session::carrier::format_tasks;
use autoevolver::session::{BatchIo, Planner, Session, bot_agent, connect, list_session_logs, read_session_log};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let root = std::env::current_dir().context("Failed to resolve working directory")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "AutoEvolver loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::Run) => cmd_run(&config, &root).await,
        Some(Command::Plan {
            objective,
            context,
            skip_feasibility,
            max_passes,
            format,
        }) => cmd_plan(config, &root, objective, context, skip_feasibility, max_passes, format).await,
        Some(Command::Chat) => cmd_chat(&config, &root).await,
        Some(Command::Logs { list, file }) => cmd_logs(&config, &root, list, file),
        Some(Command::Config) => cmd_config(&config),
    }
}

/// Interactive session on the terminal
async fn cmd_run(config: &Config, root: &Path) -> Result<()> {
    debug!("cmd_run: called");
    let mut session = Session::from_config(config, Box::new(Console::new()), root)?;
    match session.run().await {
        Ok(_) => Ok(()),
        Err(PlanningError::Cancelled) => {
            info!("cmd_run: cancelled by user");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// One-shot decomposition; the task tree goes to stdout
async fn cmd_plan(
    mut config: Config,
    root: &Path,
    objective: String,
    context: String,
    skip_feasibility: bool,
    max_passes: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    debug!(%objective, skip_feasibility, ?max_passes, %format, "cmd_plan: called");
    if max_passes.is_some() {
        config.planning.max_subdivision_passes = max_passes;
    }

    let objective = Objective::new(objective, context)?;
    let llm = connect(&config)?;
    let planner = Planner::new(&config, llm, root);
    let mut io = BatchIo::new(format == OutputFormat::Text);

    if !skip_feasibility
        && let Assessment::Infeasible { reason } = planner.gate.assess(&objective, &mut io).await?
    {
        eprintln!("The objective is unobtainable: {}", reason);
        return Err(eyre!("Objective rejected"));
    }

    let tasks = planner.decomposer.decompose(&objective, &mut io).await?;
    match format {
        OutputFormat::Text => println!("{}", format_tasks(&tasks)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
    }
    Ok(())
}

/// Free conversation with the oracle
async fn cmd_chat(config: &Config, root: &Path) -> Result<()> {
    debug!("cmd_chat: called");
    let llm = connect(config)?;
    let prompts = PromptLoader::new(root);
    let bot = bot_agent(config, llm, &prompts);
    let mut chat = ChatSession::new(Box::new(Console::new()), bot);
    chat.run().await?;
    Ok(())
}

/// List or show saved session logs
fn cmd_logs(config: &Config, root: &Path, list: bool, file: Option<PathBuf>) -> Result<()> {
    debug!(list, ?file, "cmd_logs: called");
    let log_dir = config.session.log_dir_under(root);
    let logs = list_session_logs(&log_dir)?;

    if list {
        if logs.is_empty() {
            println!("No session logs in {}", log_dir.display());
        }
        for path in &logs {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let path = match file.or_else(|| logs.last().cloned()) {
        Some(path) => path,
        None => {
            println!("No session logs in {}", log_dir.display());
            return Ok(());
        }
    };

    for record in read_session_log(&path)? {
        println!("[{}] {}: {}", record.timestamp, record.sender, record.content);
    }
    Ok(())
}

/// Print the effective configuration as YAML
fn cmd_config(config: &Config) -> Result<()> {
    debug!("cmd_config: called");
    print!("{}", serde_yaml::to_string(config).context("Failed to serialize configuration")?);
    Ok(())
}
