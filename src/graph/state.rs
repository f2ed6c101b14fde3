//! Graph state and how node updates merge into it

use std::collections::HashMap;

use serde_json::{json, Value};

/// Graph state - a map of channel names to values
pub type State = HashMap<String, Value>;

/// How an update to a channel is merged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Reducer {
    /// Replace the value (default)
    #[default]
    Overwrite,
    /// Extend a list; a non-list update is pushed as one item
    Append,
}

impl Reducer {
    pub fn apply(self, current: Option<Value>, update: Value) -> Value {
        match self {
            Reducer::Overwrite => update,
            Reducer::Append => {
                let mut items = match current {
                    Some(Value::Array(items)) => items,
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => vec![other],
                };
                match update {
                    Value::Array(new_items) => items.extend(new_items),
                    other => items.push(other),
                }
                Value::Array(items)
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub reducer: Reducer,
    pub default: Option<Value>,
}

/// Declared channels with reducers and defaults; undeclared keys overwrite
#[derive(Debug, Clone, Default)]
pub struct StateSchema {
    channels: HashMap<String, Channel>,
}

impl StateSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema with plain overwrite channels
    pub fn simple(channels: &[&str]) -> Self {
        channels
            .iter()
            .fold(Self::new(), |schema, name| schema.channel(name))
    }

    /// Overwrite channel without a default
    pub fn channel(mut self, name: &str) -> Self {
        self.channels.insert(
            name.to_string(),
            Channel {
                reducer: Reducer::Overwrite,
                default: None,
            },
        );
        self
    }

    /// Overwrite channel starting at `default`
    pub fn channel_with_default(mut self, name: &str, default: Value) -> Self {
        self.channels.insert(
            name.to_string(),
            Channel {
                reducer: Reducer::Overwrite,
                default: Some(default),
            },
        );
        self
    }

    /// Append channel starting empty
    pub fn list(mut self, name: &str) -> Self {
        self.channels.insert(
            name.to_string(),
            Channel {
                reducer: Reducer::Append,
                default: Some(json!([])),
            },
        );
        self
    }

    pub fn reducer(&self, channel: &str) -> Reducer {
        self.channels
            .get(channel)
            .map(|c| c.reducer)
            .unwrap_or_default()
    }

    /// State holding every channel default
    pub fn initial_state(&self) -> State {
        self.channels
            .iter()
            .filter_map(|(name, c)| c.default.clone().map(|d| (name.clone(), d)))
            .collect()
    }

    /// Merge `updates` into `state` through each channel's reducer
    pub fn apply(&self, state: &mut State, updates: HashMap<String, Value>) {
        for (key, value) in updates {
            let current = state.remove(&key);
            let merged = self.reducer(&key).apply(current, value);
            state.insert(key, merged);
        }
    }
}
