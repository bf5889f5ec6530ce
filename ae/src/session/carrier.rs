//! Message carrier
//!
//! Sole owner of the session log buffer. Every line shown to the user goes
//! through here, and lines marked `should_log` are recorded.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::log::SessionLog;
use crate::agent::{ChatMessage, Narrator};
use crate::domain::Task;
use crate::planning::{InputRequest, PlanEvent, PlanningError, SessionIo, SnapshotStage};
use crate::presenter::Presenter;

pub const OBJECTIVE_PROMPT: &str = "Please enter an objective. \nExample: Please make a Tetris.";
pub const CONTEXT_PROMPT: &str =
    "Enter the context regarding the objective. \nExample: a simple Tetris that can be executed in Python. No sound is required.";
pub const ASSESSING: &str = "Determine the feasibility of your objectives ......";
pub const UNOBTAINABLE: &str = "Error: Unobtainable. \nPlease start over from the objective setting.";
pub const ACHIEVABLE: &str = "The objective has been determined to be achievable. \nGenerate task ......";

/// Render a task list one `"<content> - <tag>"` line per task
pub fn format_tasks(tasks: &[Task]) -> String {
    tasks.iter().map(Task::to_string).collect::<Vec<_>>().join("\n")
}

/// Banner shown above a task list snapshot
pub fn snapshot_banner(stage: SnapshotStage) -> String {
    match stage {
        SnapshotStage::Initial => "=== Init Task List ===".to_string(),
        SnapshotStage::Subdivided { .. } => "=== Subdivided Tasks ===".to_string(),
        SnapshotStage::Pass { pass } => format!("=== Task List after Pass {} ===", pass),
        SnapshotStage::Confirmed => "=== Confirmed Tasks ===".to_string(),
    }
}

/// Routes chat lines to the presenter and the session log
pub struct MessageCarrier {
    presenter: Box<dyn Presenter>,
    log: SessionLog,
    system: Narrator,
    user: Narrator,
}

impl MessageCarrier {
    pub fn new(presenter: Box<dyn Presenter>) -> Self {
        debug!("MessageCarrier::new: called");
        Self {
            presenter,
            log: SessionLog::new(),
            system: Narrator::system(),
            user: Narrator::user(),
        }
    }

    /// Show a message, recording it when `should_log` is set
    pub fn print_message(&mut self, message: ChatMessage) {
        self.presenter.print_message(&message);
        if message.should_log {
            self.log.record(&message);
        }
    }

    pub fn print_system(&mut self, text: impl Into<String>, should_log: bool) {
        let message = self.system.say(text, should_log);
        self.print_message(message);
    }

    pub fn print_user(&mut self, text: impl Into<String>, should_log: bool) {
        let message = self.user.say(text, should_log);
        self.print_message(message);
    }

    /// Show a banner followed by the task list
    pub fn print_tasks(&mut self, banner: &str, tasks: &[Task]) {
        self.print_system(banner, true);
        self.print_system(format_tasks(tasks), true);
    }

    /// Wait for one line from the user
    pub async fn read_input(&mut self) -> Result<String, PlanningError> {
        let text = self.presenter.request_user_input().await?;
        self.presenter.process_pending_events();
        Ok(text)
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Write the buffered log to `dir` and clear it
    pub fn save_log(&mut self, dir: &Path) -> io::Result<Option<PathBuf>> {
        self.log.save(dir)
    }
}

#[async_trait]
impl SessionIo for MessageCarrier {
    async fn request_input(&mut self, request: InputRequest) -> Result<String, PlanningError> {
        debug!(?request, "MessageCarrier::request_input: called");
        let (prompt, label) = match request {
            InputRequest::Objective => (OBJECTIVE_PROMPT, "Objective"),
            InputRequest::Context => (CONTEXT_PROMPT, "Context"),
        };
        self.print_system(prompt, true);

        let text = self.read_input().await?;
        self.print_user(format!("{}: {}", label, text), true);
        Ok(text)
    }

    fn notify(&mut self, event: PlanEvent) {
        match event {
            PlanEvent::AssessingFeasibility => self.print_system(ASSESSING, true),
            PlanEvent::Rejected { reason } => {
                self.print_system(reason, true);
                self.print_system(UNOBTAINABLE, true);
            }
            PlanEvent::Accepted => self.print_system(ACHIEVABLE, true),
            PlanEvent::InvalidObjective => self.print_system(PlanningError::EmptyObjective.to_string(), true),
            PlanEvent::OracleReturned => self.presenter.process_pending_events(),
            PlanEvent::Snapshot { stage, tasks } => {
                debug!(?stage, task_count = tasks.len(), "MessageCarrier::notify: snapshot");
                self.print_tasks(&snapshot_banner(stage), &tasks);
            }
            PlanEvent::EmptyListing { task } => {
                info!(?task, "Oracle listing held no tasks");
                let text = match task {
                    Some(task) => format!("Warning: no subtasks were listed for {}", task),
                    None => "Warning: no tasks were listed for the objective".to_string(),
                };
                self.print_system(text, true);
            }
        }
    }
}
