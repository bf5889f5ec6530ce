//! Speaker capability set
//!
//! A speaker is any participant in a chat: it has an identity, can hear what
//! others said, can be asked to say something, and may keep memory.

use async_trait::async_trait;
use tracing::debug;

use super::{ChatMessage, SenderInfo};
use crate::llm::LlmError;

/// A participant in a conversation
#[async_trait]
pub trait Speaker: Send {
    /// Who this speaker is
    fn identify(&self) -> &SenderInfo;

    /// Hear a message from another participant
    fn receive_message(&mut self, message: &ChatMessage);

    /// Say something in response to what was heard so far
    async fn produce_message(&mut self) -> Result<ChatMessage, LlmError>;

    /// Forget everything heard so far
    fn clear_memory(&mut self);
}

/// A fixed persona with no memory, used to voice system and user lines
#[derive(Debug, Clone)]
pub struct Narrator {
    sender: SenderInfo,
}

impl Narrator {
    pub fn new(sender: SenderInfo) -> Self {
        Self { sender }
    }

    pub fn system() -> Self {
        Self::new(SenderInfo::system())
    }

    pub fn user() -> Self {
        Self::new(SenderInfo::user())
    }

    /// Wrap text as a message from this persona
    pub fn say(&self, text: impl Into<String>, should_log: bool) -> ChatMessage {
        ChatMessage::new(text, self.sender.clone(), should_log)
    }
}

#[async_trait]
impl Speaker for Narrator {
    fn identify(&self) -> &SenderInfo {
        &self.sender
    }

    fn receive_message(&mut self, message: &ChatMessage) {
        debug!(from = %message.sender.persona_name, "Narrator::receive_message: ignored");
    }

    async fn produce_message(&mut self) -> Result<ChatMessage, LlmError> {
        Ok(self.say("", false))
    }

    fn clear_memory(&mut self) {}
}
