//! State graphs: nodes over shared state joined by direct and conditional edges
//!
//! A graph is built with [`StateGraph`], validated by `compile`, then run
//! with [`CompiledGraph::invoke`] or step by step with
//! [`CompiledGraph::stream`].

mod edge;
mod error;
#[allow(clippy::module_inception)]
mod graph;
pub mod messages;
mod node;
mod state;
mod tool_node;

pub use edge::{Edge, EdgeTarget, Router, RouterFn, END, START};
pub use error::{GraphError, Result};
pub use graph::{CompiledGraph, StateGraph, DEFAULT_RECURSION_LIMIT};
pub use node::{FunctionNode, Node, NodeOutput, PassthroughNode, SyncNode};
pub use state::{Channel, Reducer, State, StateSchema};
pub use tool_node::{ModelNode, ToolNode, MESSAGES};
