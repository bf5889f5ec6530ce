//! Anthropic Claude API client implementation
//!
//! Implements the LlmClient trait for Anthropic's Messages API. The Messages
//! API takes system text out-of-band, so the leading run of system entries
//! becomes the `system` field and any later system entry is sent as a user turn.
//! The API also requires the first turn to come from the user.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::endpoint::Endpoint;
use super::retry::send_with_retry;
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, Role, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// Messages API version sent with every request
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Opening user turn for a conversation that would otherwise start with the assistant
const OPENING_USER_TURN: &str = "Continue.";

/// Anthropic Claude API client
pub struct AnthropicClient {
    endpoint: Endpoint,
}

impl AnthropicClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "AnthropicClient::from_config: called");
        Ok(Self {
            endpoint: Endpoint::from_config(config)?,
        })
    }

    /// Build the request body for the Anthropic API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(model = %request.model, %request.max_tokens, "build_request_body: called");
        let (system, messages) = split_system(&request.messages);

        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens.min(self.endpoint.max_tokens),
            "messages": messages,
        });

        if !system.is_empty() {
            body["system"] = serde_json::json!(system);
        }

        body
    }

    /// Parse the Anthropic API response
    fn parse_response(&self, api_response: AnthropicResponse) -> CompletionResponse {
        debug!(?api_response.stop_reason, "parse_response: called");
        let content = api_response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .next();

        CompletionResponse {
            content,
            stop_reason: StopReason::from_anthropic(&api_response.stop_reason),
            usage: TokenUsage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            },
        }
    }
}

/// Split a conversation into the Messages API `system` text and turns
///
/// The turns always open with a user turn. When there are no turns, or the
/// first one is the assistant's, the last leading system entry is sent as the
/// opening user turn instead. With no system entry to promote, a fixed
/// placeholder opens the conversation.
fn split_system(messages: &[Message]) -> (String, Vec<serde_json::Value>) {
    let leading = messages.iter().take_while(|m| m.role == Role::System).count();
    let (mut system_entries, rest) = messages.split_at(leading);

    let opening;
    let mut turns: Vec<&Message> = rest.iter().collect();
    if turns.first().is_none_or(|m| m.role == Role::Assistant) {
        opening = match system_entries.split_last() {
            Some((last, head)) => {
                debug!("split_system: promoting final system entry to user turn");
                system_entries = head;
                Message::user(last.content.clone())
            }
            None => {
                debug!("split_system: inserting opening user turn");
                Message::user(OPENING_USER_TURN)
            }
        };
        turns.insert(0, &opening);
    }

    let system = system_entries
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let turns = turns
        .into_iter()
        .map(|m| {
            let role = match m.role {
                Role::Assistant => "assistant",
                Role::User | Role::System => "user",
            };
            serde_json::json!({
                "role": role,
                "content": m.content,
            })
        })
        .collect();

    (system, turns)
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %request.model, message_count = request.messages.len(), "complete: called");
        let url = self.endpoint.url("/v1/messages");
        let body = self.build_request_body(&request);

        let response = send_with_retry(
            || {
                self.endpoint.http
                    .post(&url)
                    .header("x-api-key", &self.endpoint.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&body)
            },
            self.endpoint.max_retries,
            self.endpoint.timeout,
        )
        .await?;

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::BadResponse(e.to_string()))?;
        Ok(self.parse_response(api_response))
    }
}

// Anthropic API response types

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: String,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}
