//! OpenAI API client implementation
//!
//! Implements the LlmClient trait for OpenAI's Chat Completions API. Every
//! conversation entry, including system entries, is sent in order as-is.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::endpoint::Endpoint;
use super::retry::send_with_retry;
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// OpenAI API client
pub struct OpenAIClient {
    endpoint: Endpoint,
}

impl OpenAIClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable or file named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "OpenAIClient::from_config: called");
        Ok(Self {
            endpoint: Endpoint::from_config(config)?,
        })
    }

    /// Build the request body for the OpenAI API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(model = %request.model, %request.max_tokens, "build_request_body: called");

        let max_tokens = request.max_tokens.min(self.endpoint.max_tokens);

        // o-series and gpt-5 models take max_completion_tokens instead of max_tokens
        let uses_completion_tokens =
            request.model.starts_with("gpt-5") || request.model.starts_with("o1") || request.model.starts_with("o3");

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": self.convert_messages(&request.messages),
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    /// Convert internal Message types to OpenAI API format
    fn convert_messages(&self, messages: &[Message]) -> Vec<serde_json::Value> {
        debug!(message_count = %messages.len(), "convert_messages: called");
        messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role.as_str(),
                    "content": msg.content,
                })
            })
            .collect()
    }

    /// Parse the OpenAI API response, keeping only the first choice
    fn parse_response(&self, api_response: OpenAIResponse) -> CompletionResponse {
        debug!(choice_count = api_response.choices.len(), "parse_response: called");
        let (content, stop_reason) = match api_response.choices.into_iter().next() {
            Some(choice) => (
                choice.message.content,
                StopReason::from_openai(choice.finish_reason.as_deref()),
            ),
            None => {
                warn!("parse_response: response carried no choices");
                (None, StopReason::EndTurn)
            }
        };

        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        CompletionResponse {
            content,
            stop_reason,
            usage,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %request.model, message_count = request.messages.len(), "complete: called");
        let url = self.endpoint.url("/v1/chat/completions");
        let body = self.build_request_body(&request);

        let response = send_with_retry(
            || {
                self.endpoint.http
                    .post(&url)
                    .header("Authorization", format!("Bearer {}", self.endpoint.api_key))
                    .json(&body)
            },
            self.endpoint.max_retries,
            self.endpoint.timeout,
        )
        .await?;

        let api_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LlmError::BadResponse(e.to_string()))?;
        Ok(self.parse_response(api_response))
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
