//! Chat models and the message types they exchange

mod json;
mod model;
mod scripted;
mod types;

pub use json::extract_json;
pub use model::{ChatModel, GenaiModel};
pub use scripted::{RecordedRequest, ScriptedModel};
pub use types::{Message, Role, ToolCall, ToolSpec, Usage};

/// Errors raised by model calls and reply parsing
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request to {model} failed: {message}")]
    Request { model: String, message: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("no scripted response left (after {0} requests)")]
    Exhausted(usize),

    #[error("model reply is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("model reply is missing required field `{0}`")]
    MissingField(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
