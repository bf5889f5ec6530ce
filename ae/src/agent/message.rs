//! Chat messages exchanged between speakers and the presenter

use serde::{Deserialize, Serialize};

use crate::llm::Role;

/// Who said something
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderInfo {
    /// Stable internal name (e.g. "system", "bot")
    pub persona_name: String,
    /// Name written to the session log
    pub display_name: String,
    pub role: Role,
}

impl SenderInfo {
    pub fn new(persona_name: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            persona_name: persona_name.into(),
            display_name: display_name.into(),
            role,
        }
    }

    pub fn system() -> Self {
        Self::new("system", "System", Role::System)
    }

    pub fn user() -> Self {
        Self::new("user", "User", Role::User)
    }

    pub fn bot() -> Self {
        Self::new("bot", "Bot", Role::Assistant)
    }
}

/// One role-tagged line of the conversation shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub sender: SenderInfo,
    /// Whether the carrier records this line in the session log
    pub should_log: bool,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, sender: SenderInfo, should_log: bool) -> Self {
        Self {
            text: text.into(),
            sender,
            should_log,
        }
    }
}
