//! Tools exposed to chat models
//!
//! A tool is a named async function over JSON arguments. The registry turns
//! model-issued tool calls into tool messages; a failing or unknown tool never
//! aborts the run, its error text is what the model sees.

mod impls;
mod schema;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::{Message, ToolCall, ToolSpec};

pub use impls::{
    arithmetic_tools, format_number, ArithmeticOp, ArithmeticTool, CurrentTimeTool,
    DocumentBuffer, FactorialTool, FortunateWheelTool, RetrieverTool, SaveTool, UpdateTool,
    WHEEL_OUTCOMES,
};
pub use schema::{
    integer_prop, number_prop, object_schema, required_fields, string_prop, SchemaBuilder,
};

/// Reply for calls naming a tool that is not registered
pub const UNKNOWN_TOOL_MESSAGE: &str =
    "Incorrect Tool Name, Please Retry and Select tool from List of Available tools.";

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ToolError>;

/// A callable exposed to the model
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object
    fn schema(&self) -> Value;

    async fn call(&self, args: Value) -> Result<String>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            schema: self.schema(),
        }
    }
}

/// Deserialize tool arguments into a params struct
pub fn parse_params<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

/// Registry of available tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Builder-style `register`
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Arc::new(tool));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Specs to offer the model, sorted by name
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.names()
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.spec())
            .collect()
    }

    /// Run one tool call and wrap the outcome as a tool message
    pub async fn execute(&self, call: &ToolCall) -> Message {
        let Some(tool) = self.get(&call.name) else {
            warn!("Tool {} does not exist", call.name);
            return Message::tool(call, UNKNOWN_TOOL_MESSAGE);
        };

        debug!("Calling tool {} with {}", call.name, call.args);
        match tool.call(call.args.clone()).await {
            Ok(output) => {
                debug!("Tool {} returned {} chars", call.name, output.len());
                Message::tool(call, output)
            },
            Err(e) => {
                warn!("Tool {} failed: {}", call.name, e);
                Message::tool(call, format!("Error: {}", e))
            },
        }
    }
}
