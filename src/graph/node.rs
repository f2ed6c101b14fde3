//! Node types for graph execution

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde_json::Value;

use super::error::Result;
use super::messages::to_value;
use super::state::State;
use crate::llm::Message;

/// State updates produced by one node execution
#[derive(Debug, Default)]
pub struct NodeOutput {
    pub updates: HashMap<String, Value>,
}

impl NodeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_update(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.updates.insert(key.to_string(), value.into());
        self
    }

    /// Messages for a list channel; the channel's reducer decides append vs replace
    pub fn with_messages(self, channel: &str, messages: &[Message]) -> Self {
        self.with_update(channel, to_value(messages))
    }
}

/// A unit of work over the graph state
#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, state: &State) -> Result<NodeOutput>;
}

type AsyncNodeFn =
    Box<dyn Fn(State) -> Pin<Box<dyn Future<Output = Result<NodeOutput>> + Send>> + Send + Sync>;

/// Async function node; receives a snapshot of the state
pub struct FunctionNode {
    name: String,
    func: AsyncNodeFn,
}

impl FunctionNode {
    pub fn new<F, Fut>(name: &str, func: F) -> Self
    where
        F: Fn(State) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NodeOutput>> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            func: Box::new(move |state| Box::pin(func(state))),
        }
    }
}

#[async_trait]
impl Node for FunctionNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, state: &State) -> Result<NodeOutput> {
        (self.func)(state.clone()).await
    }
}

type SyncNodeFn = Box<dyn Fn(&State) -> Result<NodeOutput> + Send + Sync>;

/// Plain synchronous function node
pub struct SyncNode {
    name: String,
    func: SyncNodeFn,
}

impl SyncNode {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&State) -> Result<NodeOutput> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl Node for SyncNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, state: &State) -> Result<NodeOutput> {
        (self.func)(state)
    }
}

/// Leaves state unchanged; useful as a routing hub
pub struct PassthroughNode {
    name: String,
}

impl PassthroughNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Node for PassthroughNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _state: &State) -> Result<NodeOutput> {
        Ok(NodeOutput::new())
    }
}
