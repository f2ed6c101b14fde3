//! Single LLM agents and the runner that drives them over sessions
//!
//! An `LlmAgent` pairs a chat model with an instruction and tools. The
//! `Runner` feeds it one user message at a time, executing tool calls until
//! the model answers, and records every step as a session event.

mod runner;

use std::sync::Arc;

use serde_json::Value;

use crate::llm::{extract_json, ChatModel, LlmError};
use crate::session::SessionError;
use crate::template::TemplateError;
use crate::tools::{required_fields, Tool, ToolRegistry};

pub use runner::Runner;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("instruction: {0}")]
    Template(#[from] TemplateError),

    #[error("agent {agent} gave no final answer within {steps} model turns")]
    StepLimit { agent: String, steps: usize },
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Clone)]
pub struct LlmAgent {
    name: String,
    model: Arc<dyn ChatModel>,
    description: String,
    instruction: String,
    tools: ToolRegistry,
    output_schema: Option<Value>,
    output_key: Option<String>,
}

impl LlmAgent {
    pub fn new(name: impl Into<String>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            name: name.into(),
            model,
            description: String::new(),
            instruction: String::new(),
            tools: ToolRegistry::empty(),
            output_schema: None,
            output_key: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Instruction template; `{state_key}` placeholders are filled from session state
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools = self.tools.with(tool);
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    /// Require the final reply to be a JSON object matching `schema`
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Store the final reply in session state under `key`
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    fn system_prompt(&self, rendered_instruction: String) -> String {
        match &self.output_schema {
            Some(schema) => format!(
                "{}\n\nReply with a single JSON object matching this schema:\n{}",
                rendered_instruction.trim_end(),
                schema
            ),
            None => rendered_instruction,
        }
    }

    /// Final reply as it goes into state: parsed and checked JSON with a
    /// schema, the raw text otherwise
    fn output_value(&self, reply: &str) -> std::result::Result<Value, LlmError> {
        let Some(schema) = &self.output_schema else {
            return Ok(Value::String(reply.to_string()));
        };
        let value = extract_json(reply)?;
        let object = value
            .as_object()
            .ok_or_else(|| LlmError::InvalidJson("expected a JSON object".to_string()))?;
        let missing = required_fields(schema)
            .into_iter()
            .find(|f| !object.contains_key(*f));
        if let Some(missing) = missing {
            return Err(LlmError::MissingField(missing.to_string()));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use crate::tools::{object_schema, string_prop};
    use serde_json::json;

    fn paragraph_agent() -> LlmAgent {
        LlmAgent::new("paragraph_agent", Arc::new(ScriptedModel::new("scripted")))
            .with_output_schema(
                object_schema()
                    .property("para", string_prop("Paragraph"), true)
                    .build(),
            )
            .with_output_key("para")
    }

    #[test]
    fn test_output_value_with_schema() {
        let agent = paragraph_agent();
        let value = agent
            .output_value("```json\n{\"para\": \"Tides follow the moon.\"}\n```")
            .unwrap();
        assert_eq!(value, json!({"para": "Tides follow the moon."}));

        assert!(matches!(
            agent.output_value(r#"{"paragraph": "x"}"#),
            Err(LlmError::MissingField(f)) if f == "para"
        ));
        assert!(matches!(agent.output_value("[1, 2]"), Err(LlmError::InvalidJson(_))));
    }

    #[test]
    fn test_output_value_raw_text() {
        let agent = LlmAgent::new("plain", Arc::new(ScriptedModel::new("scripted")));
        assert_eq!(agent.output_value("hello").unwrap(), json!("hello"));
    }

    #[test]
    fn test_system_prompt_mentions_schema() {
        let prompt = paragraph_agent().system_prompt("Write a paragraph.".to_string());
        assert!(prompt.starts_with("Write a paragraph."));
        assert!(prompt.contains("\"para\""));
    }
}
