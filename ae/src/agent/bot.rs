//! Conversation agent wrapping the oracle
//!
//! Three interaction modes share one client:
//! - `ask`: stateless, one system entry, nothing remembered
//! - `ask_with_memory`: the whole conversation is replayed and grows by append
//! - `compact`: the conversation is replaced by a single dense summary

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{ChatMessage, SenderInfo, Speaker};
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, Role};
use crate::prompts::embedded;

/// A chat bot with optional accumulated memory
pub struct BotAgent {
    llm: Arc<dyn LlmClient>,
    model: String,
    max_tokens: u32,
    compact_instruction: String,
    conversation: Vec<Message>,
    sender: SenderInfo,
}

impl BotAgent {
    /// Create an agent with an empty conversation
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, max_tokens: u32) -> Self {
        let model = model.into();
        debug!(%model, %max_tokens, "BotAgent::new: called");
        Self {
            llm,
            model,
            max_tokens,
            compact_instruction: embedded::COMPACT.to_string(),
            conversation: Vec::new(),
            sender: SenderInfo::bot(),
        }
    }

    /// Replace the instruction sent by `compact`
    pub fn with_compact_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.compact_instruction = instruction.into();
        self
    }

    /// A new agent on the same client and model, with empty memory
    pub fn spawn(&self) -> Self {
        debug!("BotAgent::spawn: called");
        Self {
            llm: self.llm.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            compact_instruction: self.compact_instruction.clone(),
            conversation: Vec::new(),
            sender: self.sender.clone(),
        }
    }

    /// The remembered conversation, in order
    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    async fn send(&self, messages: Vec<Message>) -> Result<String, LlmError> {
        debug!(message_count = messages.len(), "BotAgent::send: called");
        let request = CompletionRequest::new(self.model.clone(), messages, self.max_tokens);
        let response = self.llm.complete(request).await?;
        Ok(response.into_text())
    }

    /// One-shot prompt sent as a single system entry; memory is untouched
    pub async fn ask(&self, prompt: impl Into<String>) -> Result<String, LlmError> {
        debug!("BotAgent::ask: called");
        self.send(vec![Message::system(prompt)]).await
    }

    /// Remember an entry without sending anything
    pub fn add_context(&mut self, entry: Message) {
        debug!(role = %entry.role, "BotAgent::add_context: called");
        self.conversation.push(entry);
    }

    /// Append `entry`, send the whole conversation, remember and return the reply
    pub async fn ask_with_memory(&mut self, entry: Message) -> Result<String, LlmError> {
        debug!(role = %entry.role, conversation_len = self.conversation.len(), "BotAgent::ask_with_memory: called");
        self.conversation.push(entry);
        self.respond_to_conversation().await
    }

    async fn respond_to_conversation(&mut self) -> Result<String, LlmError> {
        let reply = self.send(self.conversation.clone()).await?;
        self.conversation.push(Message::assistant(reply.clone()));
        Ok(reply)
    }

    /// Replace the conversation with one assistant entry summarizing it
    pub async fn compact(&mut self) -> Result<(), LlmError> {
        debug!(conversation_len = self.conversation.len(), "BotAgent::compact: called");
        let mut messages = self.conversation.clone();
        messages.push(Message::system(self.compact_instruction.clone()));

        let summary = self.send(messages).await?;
        info!(summary_len = summary.len(), "Compacted agent memory");
        self.conversation = vec![Message::assistant(summary)];
        Ok(())
    }

    /// Forget the conversation
    pub fn clear(&mut self) {
        debug!("BotAgent::clear: called");
        self.conversation.clear();
    }
}

#[async_trait]
impl Speaker for BotAgent {
    fn identify(&self) -> &SenderInfo {
        &self.sender
    }

    fn receive_message(&mut self, message: &ChatMessage) {
        let entry = match message.sender.role {
            Role::System => Message::system(message.text.clone()),
            Role::User => Message::user(message.text.clone()),
            Role::Assistant => Message::assistant(message.text.clone()),
        };
        self.add_context(entry);
    }

    async fn produce_message(&mut self) -> Result<ChatMessage, LlmError> {
        debug!("BotAgent::produce_message: called");
        let reply = self.respond_to_conversation().await?;
        Ok(ChatMessage::new(reply, self.sender.clone(), true))
    }

    fn clear_memory(&mut self) {
        self.clear();
    }
}
