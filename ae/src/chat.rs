//! Free conversation with the oracle
//!
//! The user and the bot are both `Speaker`s; the user's narrator voices each
//! line and the bot answers with its accumulated memory.

use colored::Colorize;
use tracing::{debug, info};

use crate::agent::{BotAgent, Narrator, Speaker};
use crate::llm::Role;
use crate::planning::PlanningError;
use crate::presenter::Presenter;

/// Result of handling a slash command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashResult {
    Continue,
    Quit,
}

/// Interactive chat loop
pub struct ChatSession {
    presenter: Box<dyn Presenter>,
    bot: BotAgent,
    user: Narrator,
    system: Narrator,
}

impl ChatSession {
    pub fn new(presenter: Box<dyn Presenter>, bot: BotAgent) -> Self {
        debug!("ChatSession::new: called");
        Self {
            presenter,
            bot,
            user: Narrator::user(),
            system: Narrator::system(),
        }
    }

    fn say(&mut self, text: impl Into<String>) {
        let message = self.system.say(text, false);
        self.presenter.print_message(&message);
    }

    /// Run until `/quit` or end of input
    pub async fn run(&mut self) -> Result<(), PlanningError> {
        info!("Chat started");
        self.say(format!(
            "AutoEvolver chat. Type {} for help, {} to quit",
            "/help".yellow(),
            "/quit".yellow()
        ));

        loop {
            let line = match self.presenter.request_user_input().await {
                Ok(line) => line,
                Err(PlanningError::Cancelled) => {
                    debug!("ChatSession::run: input closed");
                    break;
                }
                Err(e) => return Err(e),
            };
            self.presenter.process_pending_events();

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if input.starts_with('/') {
                match self.handle_slash_command(input).await {
                    SlashResult::Continue => continue,
                    SlashResult::Quit => break,
                }
            }

            let message = self.user.say(input, true);
            self.bot.receive_message(&message);
            match self.bot.produce_message().await {
                Ok(reply) => self.presenter.print_message(&reply),
                Err(e) => self.say(format!("Error: {}", e)),
            }
            self.presenter.process_pending_events();
        }

        info!("Chat ended");
        Ok(())
    }

    /// Handle slash commands
    pub async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let cmd = input.split_whitespace().next().unwrap_or("");
        debug!(%cmd, "ChatSession::handle_slash_command: called");

        match cmd {
            "/help" | "/h" => {
                self.say(
                    [
                        "Available Commands:",
                        "  /help      Show this help",
                        "  /quit      Exit the chat",
                        "  /clear     Forget the conversation",
                        "  /compact   Squash the conversation into a summary",
                        "  /history   Show the conversation",
                    ]
                    .join("\n"),
                );
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/clear" | "/c" => {
                self.bot.clear_memory();
                self.say("Conversation cleared.");
                SlashResult::Continue
            }
            "/compact" => {
                let before = self.bot.conversation().len();
                match self.bot.compact().await {
                    Ok(()) => self.say(format!("Compacted {} entries into one.", before)),
                    Err(e) => self.say(format!("Error: {}", e)),
                }
                self.presenter.process_pending_events();
                SlashResult::Continue
            }
            "/history" => {
                self.say(self.history());
                SlashResult::Continue
            }
            _ => {
                self.say(format!("Unknown command: {}. Type /help for available commands", cmd));
                SlashResult::Continue
            }
        }
    }

    fn history(&self) -> String {
        let conversation = self.bot.conversation();
        if conversation.is_empty() {
            return "No conversation history.".to_string();
        }

        conversation
            .iter()
            .enumerate()
            .map(|(i, msg)| {
                let role = match msg.role {
                    Role::System => "System",
                    Role::User => "User",
                    Role::Assistant => "Bot",
                };
                let preview: String = msg.content.chars().take(50).collect();
                let ellipsis = if msg.content.chars().count() > 50 { "..." } else { "" };
                format!("{}. {}: {}{}", i + 1, role, preview, ellipsis)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;
    use crate::llm::client::mock::MockLlmClient;
    use crate::presenter::scripted::{ScriptedPresenter, texts};
    use std::sync::Arc;

    fn chat(mock: &Arc<MockLlmClient>, inputs: &[&str]) -> (ChatSession, Arc<std::sync::Mutex<Vec<crate::agent::ChatMessage>>>) {
        let presenter = ScriptedPresenter::with_inputs(inputs);
        let transcript = presenter.transcript();
        let bot = BotAgent::new(mock.clone(), "test-model", 256);
        (ChatSession::new(Box::new(presenter), bot), transcript)
    }

    #[tokio::test]
    async fn test_chat_replies_with_memory() {
        let mock = Arc::new(MockLlmClient::with_replies(&["Hi!", "You said hello."]));
        let (mut session, transcript) = chat(&mock, &["hello", "", "what did I say?", "/quit", "never read"]);

        session.run().await.unwrap();

        let shown = texts(&transcript);
        assert!(shown.contains(&"Hi!".to_string()));
        assert!(shown.contains(&"You said hello.".to_string()));
        assert_eq!(
            mock.requests()[1].messages,
            vec![
                Message::user("hello"),
                Message::assistant("Hi!"),
                Message::user("what did I say?"),
            ]
        );
    }

    #[tokio::test]
    async fn test_chat_ends_on_closed_input() {
        let mock = Arc::new(MockLlmClient::new(vec![]));
        let (mut session, _) = chat(&mock, &[]);
        assert!(session.run().await.is_ok());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_slash_commands() {
        let mock = Arc::new(MockLlmClient::with_replies(&["reply", "dense"]));
        let (mut session, transcript) = chat(&mock, &["question", "/history", "/compact", "/clear", "/bogus"]);

        session.run().await.unwrap();

        let shown = texts(&transcript);
        assert!(shown.iter().any(|t| t.contains("1. User: question")));
        assert!(shown.contains(&"Compacted 2 entries into one.".to_string()));
        assert!(shown.contains(&"Conversation cleared.".to_string()));
        assert!(shown.iter().any(|t| t.starts_with("Unknown command: /bogus")));
        assert!(session.bot.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_oracle_error_does_not_end_chat() {
        let mock = Arc::new(MockLlmClient::new(vec![]));
        let (mut session, transcript) = chat(&mock, &["hello", "/quit"]);

        session.run().await.unwrap();

        assert!(texts(&transcript).iter().any(|t| t.starts_with("Error: ")));
    }
}
