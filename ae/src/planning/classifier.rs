//! Task classifier
//!
//! Asks the oracle for one digit and maps it through the `TaskTag` table.
//! Only the first character of the reply is read.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{PlanEvent, PlanningError, SessionIo};
use crate::agent::BotAgent;
use crate::domain::{Objective, Task, TaskTag};
use crate::prompts::{PromptContext, PromptLoader};

/// Read the tag from the first character of a classifier reply
pub fn parse_tag(response: &str) -> Option<TaskTag> {
    response.chars().next()?.to_digit(10).and_then(TaskTag::from_digit)
}

/// Maps task text to a `TaskTag` using the oracle
pub struct TaskClassifier {
    agent: BotAgent,
    prompts: Arc<PromptLoader>,
    retries: u32,
}

impl TaskClassifier {
    /// `retries` stricter re-asks are made before a malformed reply is fatal
    pub fn new(agent: BotAgent, prompts: Arc<PromptLoader>, retries: u32) -> Self {
        debug!(%retries, "TaskClassifier::new: called");
        Self {
            agent,
            prompts,
            retries,
        }
    }

    /// Classify one task, grounded in the objective
    ///
    /// Every oracle reply, re-asks included, is followed by
    /// `PlanEvent::OracleReturned`.
    pub async fn classify(
        &self,
        objective: &Objective,
        task_text: &str,
        io: &mut dyn SessionIo,
    ) -> Result<TaskTag, PlanningError> {
        debug!(%task_text, "TaskClassifier::classify: called");
        let ctx = PromptContext::for_objective(objective)
            .with_task(task_text)
            .with_tag_options();

        let prompt = self.prompts.render("classify", &ctx).map_err(PlanningError::prompt)?;
        let mut response = self.agent.ask(prompt).await?;
        io.notify(PlanEvent::OracleReturned);

        for attempt in 1..=self.retries {
            if let Some(tag) = parse_tag(&response) {
                debug!(%tag, "TaskClassifier::classify: parsed");
                return Ok(tag);
            }
            warn!(attempt, %task_text, %response, "Unreadable classification, re-asking");
            let prompt = self
                .prompts
                .render("classify-strict", &ctx)
                .map_err(PlanningError::prompt)?;
            response = self.agent.ask(prompt).await?;
            io.notify(PlanEvent::OracleReturned);
        }

        parse_tag(&response).ok_or_else(|| PlanningError::Parse {
            task: task_text.to_string(),
            response,
        })
    }

    /// Classify and wrap into a `Task`
    pub async fn build_task(
        &self,
        objective: &Objective,
        task_text: &str,
        io: &mut dyn SessionIo,
    ) -> Result<Task, PlanningError> {
        let tag = self.classify(objective, task_text, io).await?;
        Ok(Task::new(task_text, tag))
    }
}
