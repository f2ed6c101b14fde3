//! Chat model seam and the genai-backed implementation

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use genai::chat::{
    ChatMessage, ChatOptions, ChatRequest, ChatRole, ChatStreamEvent, ContentPart,
    MessageContent, Tool, ToolCall as GenaiToolCall, ToolResponse,
};
use genai::Client;
use tracing::{debug, error, info, warn};

use super::types::{Message, Role, ToolCall, ToolSpec, Usage};
use super::{LlmError, Result};
use crate::config::AgentRuntimeConfig;

/// One model turn: conversation in, assistant message out.
///
/// The reply may carry tool calls; executing them is the caller's job.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logging
    fn name(&self) -> &str;

    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message>;
}

impl From<&GenaiToolCall> for ToolCall {
    fn from(tc: &GenaiToolCall) -> Self {
        Self {
            id: tc.call_id.clone(),
            name: tc.fn_name.clone(),
            args: tc.fn_arguments.clone(),
        }
    }
}

impl From<&ToolCall> for GenaiToolCall {
    fn from(tc: &ToolCall) -> Self {
        GenaiToolCall {
            call_id: tc.id.clone(),
            fn_name: tc.name.clone(),
            fn_arguments: tc.args.clone(),
        }
    }
}

/// Convert our message into genai's representation
fn to_chat_message(msg: &Message) -> ChatMessage {
    match msg.role {
        Role::System => ChatMessage::system(msg.content.clone()),
        Role::User => ChatMessage::user(msg.content.clone()),
        Role::Assistant if msg.tool_calls.is_empty() => ChatMessage::assistant(msg.content.clone()),
        Role::Assistant => {
            let mut content = MessageContent::default();
            if !msg.content.is_empty() {
                content = content.append(ContentPart::Text(msg.content.clone()));
            }
            for tc in &msg.tool_calls {
                content = content.append(ContentPart::ToolCall(tc.into()));
            }
            ChatMessage {
                role: ChatRole::Assistant,
                content,
                options: None,
            }
        },
        Role::Tool => {
            let call_id = msg.tool_call_id.clone().unwrap_or_default();
            ChatMessage::from(ToolResponse::new(call_id, msg.content.clone()))
        },
    }
}

/// Chat model backed by genai, which resolves the provider from the model name
/// (gemini-*, groq-hosted llama, local ollama models).
pub struct GenaiModel {
    client: Client,
    config: AgentRuntimeConfig,
    total_usage: Mutex<Usage>,
}

impl GenaiModel {
    pub fn new(config: AgentRuntimeConfig) -> Self {
        Self {
            client: Client::default(),
            config,
            total_usage: Mutex::new(Usage::default()),
        }
    }

    fn build_request(&self, messages: &[Message], tools: &[ToolSpec]) -> ChatRequest {
        let mut request = ChatRequest::new(messages.iter().map(to_chat_message).collect());
        if !tools.is_empty() {
            request = request.with_tools(
                tools
                    .iter()
                    .map(|spec| {
                        Tool::new(spec.name.clone())
                            .with_description(spec.description.clone())
                            .with_schema(spec.schema.clone())
                    })
                    .collect::<Vec<_>>(),
            );
        }
        request
    }

    fn record_usage(&self, genai_usage: &genai::chat::Usage) {
        let turn = Usage {
            input_tokens: genai_usage.prompt_tokens.unwrap_or(0) as u32,
            output_tokens: genai_usage.completion_tokens.unwrap_or(0) as u32,
        };
        let mut total = self.total_usage.lock().unwrap_or_else(PoisonError::into_inner);
        *total += turn;
        info!(
            "Usage: input {} tokens, output {} tokens (session total {})",
            turn.input_tokens,
            turn.output_tokens,
            total.total()
        );
    }

    /// Run one streaming request and collect it into an assistant message
    async fn exec_once(&self, request: ChatRequest, options: &ChatOptions) -> Result<Message> {
        let response = self
            .client
            .exec_chat_stream(&self.config.model, request, Some(options))
            .await
            .map_err(|e| LlmError::Request {
                model: self.config.model.clone(),
                message: format!("{:#}", e),
            })?;

        let mut stream = Box::pin(response.stream);
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        while let Some(event) = stream.next().await {
            match event.map_err(|e| LlmError::Stream(format!("{:?}", e)))? {
                ChatStreamEvent::Chunk(chunk) => text.push_str(&chunk.content),
                ChatStreamEvent::End(end) => {
                    if let Some(ref genai_usage) = end.captured_usage {
                        self.record_usage(genai_usage);
                    } else {
                        debug!("No captured_usage in End event");
                    }
                    if let Some(captured) = end.captured_into_tool_calls() {
                        tool_calls = captured.iter().map(ToolCall::from).collect();
                    }
                },
                _ => {},
            }
        }

        debug!(
            "Model {} replied: {} chars, {} tool calls",
            self.config.model,
            text.len(),
            tool_calls.len()
        );
        Ok(Message::assistant_with_tools(text, tool_calls))
    }
}

/// Delay before retry `attempt` (1-based): 500ms doubling, capped at 8s
fn backoff(attempt: u32) -> Duration {
    let millis = 500u64.saturating_mul(1 << attempt.saturating_sub(1).min(4));
    Duration::from_millis(millis)
}

#[async_trait]
impl ChatModel for GenaiModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message> {
        let request = self.build_request(messages, tools);
        let options = ChatOptions::default()
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature)
            .with_capture_usage(true)
            .with_capture_tool_calls(true);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.exec_once(request.clone(), &options).await {
                Ok(message) => {
                    info!("Chat request successful ({})", self.config.model);
                    return Ok(message);
                },
                Err(e) if attempt < self.config.max_retries => {
                    warn!("Chat request failed (attempt {}): {}", attempt, e);
                    tokio::time::sleep(backoff(attempt)).await;
                },
                Err(e) => {
                    error!("Chat request failed after {} attempts: {}", attempt, e);
                    return Err(e);
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_millis(1000));
        assert_eq!(backoff(5), Duration::from_millis(8000));
        assert_eq!(backoff(30), Duration::from_millis(8000));
    }

    #[test]
    fn test_tool_call_conversion() {
        let ours = ToolCall::new("call_9", "factorial", json!({"a": 5}));
        let theirs = GenaiToolCall::from(&ours);
        assert_eq!(theirs.fn_name, "factorial");
        assert_eq!(ToolCall::from(&theirs), ours);
    }

    #[test]
    fn test_assistant_with_tools_keeps_role() {
        let msg = Message::assistant_with_tools(
            "checking",
            vec![ToolCall::new("c1", "get_current_time", json!({}))],
        );
        let chat = to_chat_message(&msg);
        assert!(matches!(chat.role, ChatRole::Assistant));
    }
}
