//! Session orchestration
//!
//! A session runs Feasibility Gate → Decomposer, then saves the log and waits
//! for a final keypress. All user-facing output goes through the
//! `MessageCarrier`.

mod batch;
pub mod carrier;
pub mod log;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

pub use batch::BatchIo;
pub use carrier::MessageCarrier;
pub use log::{LogRecord, SessionLog, list_session_logs, read_session_log};

use crate::agent::BotAgent;
use crate::config::Config;
use crate::documents::DocumentReader;
use crate::domain::Task;
use crate::llm::{LlmClient, create_client};
use crate::planning::{Decomposer, DecomposerConfig, FeasibilityGate, PlanningError, TaskClassifier};
use crate::presenter::Presenter;
use crate::prompts::PromptLoader;

pub const START_BANNER: &str = "=== Start Session ===";
pub const END_BANNER: &str = "=== End Session ===";
pub const EXIT_PROMPT: &str = "Enter something and it will exit.";

/// Resolve the configured client, failing before any prompt is sent
pub fn connect(config: &Config) -> Result<Arc<dyn LlmClient>, PlanningError> {
    debug!(provider = %config.llm.provider, "connect: called");
    config.validate().map_err(|e| PlanningError::Config(format!("{:#}", e)))?;
    create_client(&config.llm).map_err(|e| PlanningError::Config(e.to_string()))
}

/// A bot agent configured for planning prompts
pub fn bot_agent(config: &Config, llm: Arc<dyn LlmClient>, prompts: &PromptLoader) -> BotAgent {
    let agent = BotAgent::new(llm, config.llm.model.clone(), config.planning.max_tokens);
    match prompts.load_template("compact") {
        Ok(instruction) => agent.with_compact_instruction(instruction),
        Err(e) => {
            warn!(error = %e, "Compact template unavailable, using built-in instruction");
            agent
        }
    }
}

/// The gate and the decomposer, wired to one client
pub struct Planner {
    pub gate: FeasibilityGate,
    pub decomposer: Decomposer,
}

impl Planner {
    /// Build from configuration; prompts and documents resolve under `root`
    pub fn new(config: &Config, llm: Arc<dyn LlmClient>, root: &Path) -> Self {
        debug!(?root, "Planner::new: called");
        let prompts = Arc::new(PromptLoader::new(root));
        let agent = bot_agent(config, llm, &prompts);

        let classifier = TaskClassifier::new(agent.spawn(), prompts.clone(), config.planning.classify_retries);
        let gate = FeasibilityGate::new(
            agent.spawn(),
            prompts.clone(),
            DocumentReader::new(root),
            config.capabilities.clone(),
        );
        let decomposer = Decomposer::new(
            agent,
            classifier,
            prompts,
            DecomposerConfig {
                max_passes: config.planning.max_subdivision_passes,
            },
        );

        Self { gate, decomposer }
    }
}

/// One interactive planning session
pub struct Session {
    carrier: MessageCarrier,
    planner: Planner,
    log_dir: PathBuf,
}

impl Session {
    /// Build a session; a missing credential fails here
    pub fn from_config(config: &Config, presenter: Box<dyn Presenter>, root: &Path) -> Result<Self, PlanningError> {
        let llm = connect(config)?;
        Ok(Self::with_client(config, presenter, llm, root))
    }

    /// Build a session on an existing client
    pub fn with_client(config: &Config, presenter: Box<dyn Presenter>, llm: Arc<dyn LlmClient>, root: &Path) -> Self {
        let log_dir = config.session.log_dir_under(root);
        debug!(?log_dir, "Session::with_client: called");
        Self {
            carrier: MessageCarrier::new(presenter),
            planner: Planner::new(config, llm, root),
            log_dir,
        }
    }

    pub fn carrier(&self) -> &MessageCarrier {
        &self.carrier
    }

    /// Run the session to completion
    ///
    /// Fatal errors are shown as `Error: ...`, the log is saved, and the error
    /// is returned without further prompting. Cancellation is returned as is.
    pub async fn run(&mut self) -> Result<Vec<Task>, PlanningError> {
        info!("Session started");
        self.carrier.print_system(START_BANNER, true);

        match self.plan().await {
            Ok(tasks) => {
                self.end().await?;
                Ok(tasks)
            }
            Err(e) if e.is_fatal() => {
                error!(error = %e, "Session failed");
                self.carrier.print_system(format!("Error: {}", e), true);
                self.save_log();
                Err(e)
            }
            Err(e) => {
                info!(reason = %e, "Session ended without a plan");
                Err(e)
            }
        }
    }

    async fn plan(&mut self) -> Result<Vec<Task>, PlanningError> {
        let objective = self.planner.gate.determine(&mut self.carrier).await?;
        self.planner.decomposer.decompose(&objective, &mut self.carrier).await
    }

    async fn end(&mut self) -> Result<(), PlanningError> {
        self.carrier.print_system(END_BANNER, true);
        self.save_log();
        self.carrier.print_system(EXIT_PROMPT, false);
        self.carrier.read_input().await?;
        info!("Session ended");
        Ok(())
    }

    fn save_log(&mut self) {
        match self.carrier.save_log(&self.log_dir) {
            Ok(Some(path)) => debug!(path = %path.display(), "Session::save_log: written"),
            Ok(None) => debug!("Session::save_log: nothing to write"),
            Err(e) => warn!(error = %e, dir = %self.log_dir.display(), "Failed to save session log"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskTag;
    use crate::llm::client::mock::MockLlmClient;
    use crate::presenter::scripted::ScriptedPresenter;
    use tempfile::tempdir;

    fn config(root: &Path) -> Config {
        let mut config = Config::default();
        config.session.log_dir = root.join("log");
        config.planning.classify_retries = 0;
        config
    }

    #[tokio::test]
    async fn test_full_session_saves_log() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockLlmClient::with_replies(&[
            "Yes",
            "- print greeting\n- return greeting",
            "3",
            "3",
        ]));
        let presenter = ScriptedPresenter::with_inputs(&["Write a greeting function", "", "bye"]);
        let mut session = Session::with_client(&config(dir.path()), Box::new(presenter), mock.clone(), dir.path());

        let tasks = session.run().await.unwrap();

        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.tag() == TaskTag::UsePython));
        assert!(session.carrier().log().is_empty());

        let logs = list_session_logs(&dir.path().join("log")).unwrap();
        assert_eq!(logs.len(), 1);
        let records = read_session_log(&logs[0]).unwrap();
        let contents: Vec<_> = records.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents.first(), Some(&START_BANNER));
        assert_eq!(contents.last(), Some(&END_BANNER));
        assert!(contents.contains(&"=== Confirmed Tasks ==="));
        assert!(!contents.contains(&EXIT_PROMPT));
    }

    #[tokio::test]
    async fn test_ui_pumped_after_every_input_and_oracle_reply() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path());
        config.planning.classify_retries = 1;
        let mock = Arc::new(MockLlmClient::with_replies(&["Yes", "- print greeting", "garbled", "3"]));
        let presenter = ScriptedPresenter::with_inputs(&["Write a greeting function", "", "bye"]);
        let pumps = presenter.pump_counter();
        let mut session = Session::with_client(&config, Box::new(presenter), mock.clone(), dir.path());

        let tasks = session.run().await.unwrap();

        assert_eq!(tasks[0].tag(), TaskTag::UsePython);
        assert_eq!(mock.call_count(), 4);
        assert_eq!(pumps.load(std::sync::atomic::Ordering::SeqCst), 3 + mock.call_count());
    }

    #[tokio::test]
    async fn test_fatal_error_saves_log_and_stops() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockLlmClient::with_replies(&["Yes", "- print greeting", "7"]));
        let presenter = ScriptedPresenter::with_inputs(&["Write a greeting function", ""]);
        let mut session = Session::with_client(&config(dir.path()), Box::new(presenter), mock, dir.path());

        let result = session.run().await;

        assert!(matches!(result, Err(PlanningError::Parse { .. })));
        let logs = list_session_logs(&dir.path().join("log")).unwrap();
        let records = read_session_log(&logs[0]).unwrap();
        assert!(records.last().unwrap().content.starts_with("Error: response is not a number"));
    }

    #[tokio::test]
    async fn test_cancellation_propagates_without_saving() {
        let dir = tempdir().unwrap();
        let mock = Arc::new(MockLlmClient::new(vec![]));
        let presenter = ScriptedPresenter::default();
        let mut session = Session::with_client(&config(dir.path()), Box::new(presenter), mock, dir.path());

        let result = session.run().await;

        assert!(matches!(result, Err(PlanningError::Cancelled)));
        assert!(list_session_logs(&dir.path().join("log")).unwrap().is_empty());
    }

    #[test]
    #[serial_test::serial]
    fn test_connect_without_credential_is_config_error() {
        let mut config = Config::default();
        config.llm.api_key_env = "AE_SESSION_TEST_ABSENT".to_string();
        // SAFETY: tests touching the environment are serialized
        unsafe { std::env::remove_var("AE_SESSION_TEST_ABSENT") };

        assert!(matches!(connect(&config), Err(PlanningError::Config(_))));
    }
}
