use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::StateMap;
use crate::llm::{Message, Role};

/// Author name for events carrying user input
pub const USER_AUTHOR: &str = "user";

/// One entry of a session's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub invocation_id: String,
    /// `user` or the name of the agent that produced the event
    pub author: String,
    pub content: Message,
    #[serde(default)]
    pub state_delta: StateMap,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        invocation_id: impl Into<String>,
        author: impl Into<String>,
        content: Message,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            invocation_id: invocation_id.into(),
            author: author.into(),
            content,
            state_delta: StateMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(invocation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(invocation_id, USER_AUTHOR, Message::user(text))
    }

    pub fn with_state_delta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.state_delta.insert(key.into(), value);
        self
    }

    /// An agent's answer, as opposed to user input, tool traffic or a tool request
    pub fn is_final_response(&self) -> bool {
        self.author != USER_AUTHOR
            && self.content.role == Role::Assistant
            && !self.content.has_tool_calls()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolCall;
    use serde_json::json;

    #[test]
    fn test_final_response_rules() {
        assert!(!Event::user("inv", "hi").is_final_response());
        let reply = Event::new("inv", "qa_agent", Message::assistant("Newton's Method"));
        assert!(reply.is_final_response());

        let call = ToolCall::new("c1", "factorial", json!({"a": 3}));
        assert!(!Event::new(
            "inv",
            "tool_agent",
            Message::assistant_with_tools("", vec![call.clone()])
        )
        .is_final_response());
        assert!(!Event::new("inv", "tool_agent", Message::tool(&call, "6")).is_final_response());
    }
}
