//! Offline chat model that replays canned replies

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::model::ChatModel;
use super::types::{Message, ToolCall, ToolSpec};
use super::{LlmError, Result};

/// What a `ScriptedModel` was asked
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
}

impl RecordedRequest {
    /// Content of the last user message in the request, if any
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == super::Role::User)
            .map(|m| m.content.as_str())
    }

    pub fn system_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == super::Role::System)
            .map(|m| m.content.as_str())
    }
}

/// Chat model returning queued replies in order.
///
/// Every request is recorded so tests can assert on the prompts the
/// tutorials build. Running out of replies is an error.
#[derive(Default)]
pub struct ScriptedModel {
    name: String,
    replies: Mutex<VecDeque<Message>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Queue a plain text reply
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Message::assistant(text));
        self
    }

    /// Queue a reply requesting tool calls
    pub fn call_tools(self, calls: Vec<ToolCall>) -> Self {
        self.push(Message::assistant_with_tools("", calls));
        self
    }

    pub fn push(&self, message: Message) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(message);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message> {
        let count = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(RecordedRequest {
                messages: messages.to_vec(),
                tools: tools.iter().map(|t| t.name.clone()).collect(),
            });
            requests.len()
        };
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or(LlmError::Exhausted(count - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let model = ScriptedModel::new("scripted")
            .call_tools(vec![ToolCall::new("c1", "factorial", json!({"a": 4}))])
            .reply("24");

        let first = model
            .invoke(&[Message::system("sys"), Message::user("4!?")], &[])
            .await
            .unwrap();
        assert!(first.has_tool_calls());

        let second = model.invoke(&[Message::user("again")], &[]).await.unwrap();
        assert_eq!(second.content, "24");

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].system_text(), Some("sys"));
        assert_eq!(requests[1].last_user_text(), Some("again"));
    }

    #[tokio::test]
    async fn test_exhausted_is_an_error() {
        let model = ScriptedModel::new("scripted");
        let err = model.invoke(&[Message::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, LlmError::Exhausted(0)));
    }
}
