//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// The oracle: completes one conversation and returns the first candidate reply
///
/// This is the only seam between the planning engine and the language model.
/// Implementations own transport concerns (timeouts, retry with backoff);
/// callers own the conversation they send.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a completion request and wait for the reply
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
