//! Edges: how control moves from one node to the next
//!
//! A node has exactly one outgoing edge. A direct edge always leads to the
//! same place; a conditional edge asks a router for a label and looks the
//! label up in its path map. `START` and `END` are reserved names that never
//! belong to a real node.

use std::collections::HashMap;
use std::sync::Arc;

use super::messages::last_message;
use super::state::State;

/// Pseudo-node an edge leaves from to mark the entry point
pub const START: &str = "__start__";
/// Pseudo-node that ends the run
pub const END: &str = "__end__";

/// Where an edge leads
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeTarget {
    Node(String),
    End,
}

impl EdgeTarget {
    /// Name of the node to run next; `None` when the run ends here
    pub fn node_name(&self) -> Option<&str> {
        match self {
            Self::Node(name) => Some(name),
            Self::End => None,
        }
    }
}

/// `END` becomes [`EdgeTarget::End`], any other name a node
impl From<&str> for EdgeTarget {
    fn from(name: &str) -> Self {
        match name {
            END => Self::End,
            node => Self::Node(node.to_string()),
        }
    }
}

/// Picks a route label from the state after the source node ran
pub type RouterFn = Arc<dyn Fn(&State) -> String + Send + Sync>;

#[derive(Clone)]
pub enum Edge {
    Direct {
        source: String,
        target: EdgeTarget,
    },

    /// Labels missing from `path_map` are resolved by the compiled graph:
    /// `END` finishes, anything else is an unknown route.
    Conditional {
        source: String,
        router: RouterFn,
        path_map: HashMap<String, EdgeTarget>,
    },
}

impl Edge {
    pub fn source(&self) -> &str {
        match self {
            Self::Direct { source, .. } | Self::Conditional { source, .. } => source,
        }
    }

    /// Targets this edge may lead to, used when validating the graph
    pub fn targets(&self) -> Vec<&EdgeTarget> {
        match self {
            Self::Direct { target, .. } => vec![target],
            Self::Conditional { path_map, .. } => path_map.values().collect(),
        }
    }
}

/// Ready-made routers for conditional edges
pub struct Router;

impl Router {
    /// Route on a string field of the state.
    ///
    /// A missing or non-string field routes to `END`, so a node that decides
    /// nothing finishes the run instead of failing it.
    pub fn by_field(field: &str) -> impl Fn(&State) -> String + Send + Sync + Clone {
        let field = field.to_string();
        move |state: &State| match state.get(&field).and_then(|v| v.as_str()) {
            Some(route) => route.to_string(),
            None => END.to_string(),
        }
    }

    /// `if_true` when the last message of `channel` asks for tool calls.
    ///
    /// An empty or unreadable channel counts as no tool calls.
    pub fn has_tool_calls(
        channel: &str,
        if_true: &str,
        if_false: &str,
    ) -> impl Fn(&State) -> String + Send + Sync + Clone {
        let channel = channel.to_string();
        let if_true = if_true.to_string();
        let if_false = if_false.to_string();

        move |state: &State| {
            let wants_tools = last_message(state, &channel)
                .ok()
                .flatten()
                .is_some_and(|message| message.has_tool_calls());
            if wants_tools {
                if_true.clone()
            } else {
                if_false.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::messages::to_value;
    use crate::llm::{Message, ToolCall};
    use serde_json::json;

    #[test]
    fn test_by_field_router() {
        let router = Router::by_field("route");
        let mut state = State::new();
        assert_eq!(router(&state), END);
        state.insert("route".to_string(), json!("python_expert"));
        assert_eq!(router(&state), "python_expert");
    }

    #[test]
    fn test_has_tool_calls_router() {
        let router = Router::has_tool_calls("messages", "continue", "end");
        let mut state = State::new();
        assert_eq!(router(&state), "end");

        state.insert("messages".to_string(), to_value(&[Message::assistant("done")]));
        assert_eq!(router(&state), "end");

        let call = ToolCall::new("c1", "add", json!({"a": 1, "b": 2}));
        state.insert(
            "messages".to_string(),
            to_value(&[Message::user("1+2"), Message::assistant_with_tools("", vec![call])]),
        );
        assert_eq!(router(&state), "continue");
    }

    #[test]
    fn test_edge_target_from_end() {
        assert_eq!(EdgeTarget::from(END), EdgeTarget::End);
        assert_eq!(EdgeTarget::from(END).node_name(), None);
        assert_eq!(EdgeTarget::from("tools").node_name(), Some("tools"));
    }
}
