//! Reading and writing message lists held in graph state

use serde_json::Value;

use super::error::{GraphError, Result};
use super::state::State;
use crate::llm::Message;

/// Messages stored under `channel`; a missing channel is an empty history
pub fn messages(state: &State, channel: &str) -> Result<Vec<Message>> {
    match state.get(channel) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| GraphError::InvalidState {
            channel: channel.to_string(),
            message: e.to_string(),
        }),
    }
}

pub fn last_message(state: &State, channel: &str) -> Result<Option<Message>> {
    Ok(messages(state, channel)?.pop())
}

/// Encode messages as a state value
pub fn to_value(messages: &[Message]) -> Value {
    serde_json::to_value(messages).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_through_state() {
        let mut state = State::new();
        assert!(messages(&state, "messages").unwrap().is_empty());

        state.insert(
            "messages".to_string(),
            to_value(&[Message::user("hi"), Message::assistant("hello")]),
        );
        assert_eq!(messages(&state, "messages").unwrap().len(), 2);
        assert_eq!(last_message(&state, "messages").unwrap().unwrap().content, "hello");
    }

    #[test]
    fn test_malformed_channel() {
        let state = State::from([("messages".to_string(), json!("not a list"))]);
        assert!(matches!(
            messages(&state, "messages"),
            Err(GraphError::InvalidState { .. })
        ));
    }
}
