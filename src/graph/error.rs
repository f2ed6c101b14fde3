use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid graph structure: {0}")]
    InvalidGraph(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Edge target not found: {0}")]
    EdgeTargetNotFound(String),

    #[error("No entry point defined (missing edge from START)")]
    NoEntryPoint,

    #[error("Recursion limit of {0} node executions reached without hitting END")]
    RecursionLimitExceeded(usize),

    #[error("Router on '{node}' returned unknown route: {route}")]
    UnknownRoute { node: String, route: String },

    #[error("State channel '{channel}' is malformed: {message}")]
    InvalidState { channel: String, message: String },

    #[error("Node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Llm(#[from] crate::llm::LlmError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
