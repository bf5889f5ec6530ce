//! Non-interactive session I/O for `ae plan`
//!
//! There is no user to ask, so input requests end the run. Progress goes to
//! stderr so stdout carries only the final task list.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::carrier::{format_tasks, snapshot_banner};
use crate::planning::{InputRequest, PlanEvent, PlanningError, SessionIo};

/// Session I/O that reports progress on stderr
#[derive(Debug, Default)]
pub struct BatchIo {
    progress: bool,
}

impl BatchIo {
    /// `progress` echoes snapshots to stderr
    pub fn new(progress: bool) -> Self {
        Self { progress }
    }
}

#[async_trait]
impl SessionIo for BatchIo {
    async fn request_input(&mut self, request: InputRequest) -> Result<String, PlanningError> {
        debug!(?request, "BatchIo::request_input: no interactive input available");
        Err(PlanningError::Cancelled)
    }

    fn notify(&mut self, event: PlanEvent) {
        match event {
            PlanEvent::Snapshot { stage, tasks } if self.progress => {
                eprintln!("{}\n{}\n", snapshot_banner(stage), format_tasks(&tasks));
            }
            PlanEvent::EmptyListing { task } => {
                warn!(?task, "Oracle listing held no tasks");
                if self.progress {
                    eprintln!("Warning: empty task listing{}", task.map(|t| format!(" for {}", t)).unwrap_or_default());
                }
            }
            other => debug!(event = ?other, "BatchIo::notify"),
        }
    }
}
