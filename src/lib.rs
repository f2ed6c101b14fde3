//! Agentlab - agent tutorials on a small agent substrate
//!
//! The crate provides the pieces the tutorials are built from: chat models
//! behind one trait, tools, single agents run over sessions, state graphs
//! with conditional routing, retrieval over a local vector store and a few
//! prompt-driven text pipelines. Everything can be used as a library.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use agentlab::{
//!     AgentRuntimeConfig, Config, GenaiModel, InMemorySessionService, LlmAgent, Runner,
//!     SessionService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let model = Arc::new(GenaiModel::new(AgentRuntimeConfig::for_model(
//!         &config,
//!         &config.models.gemini,
//!     )));
//!
//!     // An agent with an instruction and no tools
//!     let agent = LlmAgent::new("greeter", model)
//!         .with_instruction("You are a helpful assistant. Greet the user warmly.");
//!
//!     let sessions = Arc::new(InMemorySessionService::new());
//!     let runner = Runner::new(agent, "demo", sessions.clone());
//!     let session = sessions
//!         .create_session("demo", "user", None, Default::default())
//!         .await?;
//!
//!     let reply = runner.ask("user", &session.id, "Hello!").await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod console;
pub mod graph;
pub mod llm;
pub mod pipelines;
pub mod rag;
pub mod session;
pub mod template;
pub mod tools;
pub mod tutorials;

// Re-export the public API
pub use agent::{AgentError, LlmAgent, Runner};
pub use config::{AgentRuntimeConfig, Config};
pub use graph::{CompiledGraph, GraphError, NodeOutput, State, StateGraph, StateSchema, END, START};
pub use llm::{ChatModel, GenaiModel, Message, Role, ToolCall};
pub use session::{InMemorySessionService, SessionService};
pub use tools::{Tool, ToolRegistry};
