//! Nodes that drive a chat model and execute the tool calls it requests

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::error::Result;
use super::messages::{last_message, messages};
use super::node::{Node, NodeOutput};
use super::state::State;
use crate::llm::{ChatModel, Message, ToolCall};
use crate::tools::ToolRegistry;

/// Message channel read and written by model and tool nodes
pub const MESSAGES: &str = "messages";

type ToolObserver = Arc<dyn Fn(&ToolCall, &Message) + Send + Sync>;

/// Executes every tool call on the last message, in order
pub struct ToolNode {
    name: String,
    tools: ToolRegistry,
    observer: Option<ToolObserver>,
}

impl ToolNode {
    pub fn new(name: &str, tools: ToolRegistry) -> Self {
        Self {
            name: name.to_string(),
            tools,
            observer: None,
        }
    }

    /// Called with each call and its result message
    pub fn with_observer(
        mut self,
        observer: impl Fn(&ToolCall, &Message) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }
}

#[async_trait]
impl Node for ToolNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, state: &State) -> Result<NodeOutput> {
        let Some(last) = last_message(state, MESSAGES)? else {
            return Ok(NodeOutput::new());
        };

        let mut results = Vec::with_capacity(last.tool_calls.len());
        for call in &last.tool_calls {
            debug!("{} executing tool {}", self.name, call.name);
            let result = self.tools.execute(call).await;
            if let Some(observer) = &self.observer {
                observer(call, &result);
            }
            results.push(result);
        }
        Ok(NodeOutput::new().with_messages(MESSAGES, &results))
    }
}

/// Calls a chat model with a system prompt over the message channel
pub struct ModelNode {
    name: String,
    model: Arc<dyn ChatModel>,
    system_prompt: Arc<dyn Fn(&State) -> String + Send + Sync>,
    tools: ToolRegistry,
}

impl ModelNode {
    pub fn new(name: &str, model: Arc<dyn ChatModel>) -> Self {
        Self {
            name: name.to_string(),
            model,
            system_prompt: Arc::new(|_| String::new()),
            tools: ToolRegistry::empty(),
        }
    }

    pub fn with_system_prompt(self, prompt: &str) -> Self {
        let prompt = prompt.to_string();
        self.with_dynamic_prompt(move |_| prompt.clone())
    }

    /// Prompt rebuilt from state on every call
    pub fn with_dynamic_prompt(
        mut self,
        prompt: impl Fn(&State) -> String + Send + Sync + 'static,
    ) -> Self {
        self.system_prompt = Arc::new(prompt);
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }
}

#[async_trait]
impl Node for ModelNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, state: &State) -> Result<NodeOutput> {
        let system = (self.system_prompt)(state);
        let mut request = Vec::new();
        if !system.is_empty() {
            request.push(Message::system(system));
        }
        request.extend(messages(state, MESSAGES)?);

        let reply = self.model.invoke(&request, &self.tools.specs()).await?;
        Ok(NodeOutput::new().with_messages(MESSAGES, &[reply]))
    }
}
