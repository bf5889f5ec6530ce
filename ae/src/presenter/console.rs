//! Terminal presenter
//!
//! Reads lines with rustyline and prints colored chat lines. User lines are
//! not echoed back because the terminal already shows what was typed.

use std::io::{self, Write};

use async_trait::async_trait;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use super::Presenter;
use crate::agent::ChatMessage;
use crate::llm::Role;
use crate::planning::PlanningError;

const PROMPT: &str = "You: ";

/// Interactive terminal front end
#[derive(Debug, Default)]
pub struct Console {
    history: Vec<String>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text printed for a message, or `None` for echoed user lines
    pub fn render(message: &ChatMessage) -> Option<String> {
        match message.sender.role {
            Role::User => None,
            Role::System => Some(message.text.cyan().to_string()),
            Role::Assistant => Some(format!("Bot: {}", message.text).yellow().to_string()),
        }
    }

    fn read_line(history: &[String]) -> Result<String, PlanningError> {
        let mut editor = DefaultEditor::new().map_err(|e| PlanningError::Io(io::Error::other(e.to_string())))?;
        for entry in history {
            let _ = editor.add_history_entry(entry.as_str());
        }

        match editor.readline(PROMPT) {
            Ok(line) => Ok(line),
            Err(ReadlineError::Interrupted) => {
                debug!("Console::read_line: interrupted");
                Err(PlanningError::Cancelled)
            }
            Err(ReadlineError::Eof) => {
                debug!("Console::read_line: end of input");
                Err(PlanningError::Cancelled)
            }
            Err(e) => Err(PlanningError::Io(io::Error::other(e.to_string()))),
        }
    }
}

#[async_trait]
impl Presenter for Console {
    async fn request_user_input(&mut self) -> Result<String, PlanningError> {
        debug!("Console::request_user_input: called");
        let history = self.history.clone();
        let line = tokio::task::block_in_place(move || Self::read_line(&history))?;
        if !line.trim().is_empty() {
            self.history.push(line.clone());
        }
        Ok(line)
    }

    fn print_message(&mut self, message: &ChatMessage) {
        let mut stdout = io::stdout().lock();
        let result = match Self::render(message) {
            Some(text) => writeln!(stdout, "{}\n", text),
            None => writeln!(stdout),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to write to terminal");
        }
    }

    fn process_pending_events(&mut self) {
        if let Err(e) = io::stdout().flush() {
            warn!(error = %e, "Failed to flush terminal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SenderInfo;

    #[test]
    fn test_render_by_role() {
        colored::control::set_override(false);

        let system = ChatMessage::new("=== Start Session ===", SenderInfo::system(), true);
        assert_eq!(Console::render(&system).as_deref(), Some("=== Start Session ==="));

        let bot = ChatMessage::new("hello", SenderInfo::bot(), true);
        assert_eq!(Console::render(&bot).as_deref(), Some("Bot: hello"));

        let user = ChatMessage::new("Objective: x", SenderInfo::user(), true);
        assert!(Console::render(&user).is_none());
    }
}
