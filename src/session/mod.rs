//! Conversation sessions: state plus an append-only event log

mod event;
mod inmemory;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use event::{Event, USER_AUTHOR};
pub use inmemory::InMemorySessionService;

/// State keys with this prefix live for one invocation and are never stored
pub const KEY_PREFIX_TEMP: &str = "temp:";

pub type StateMap = HashMap<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(SessionKey),

    #[error("session already exists: {0}")]
    AlreadyExists(SessionKey),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Identifies a session within an app and user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub state: StateMap,
    pub events: Vec<Event>,
    pub last_update_time: DateTime<Utc>,
}

impl Session {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.app_name, &self.user_id, &self.id)
    }
}

/// Drop invocation-scoped keys before state is persisted
pub(crate) fn strip_temp_keys(state: &mut StateMap) {
    state.retain(|k, _| !k.starts_with(KEY_PREFIX_TEMP));
}

#[async_trait]
pub trait SessionService: Send + Sync {
    /// Create a session; a UUID is generated when `session_id` is `None`
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<String>,
        state: StateMap,
    ) -> Result<Session>;

    async fn get_session(&self, key: &SessionKey) -> Result<Session>;

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>>;

    async fn delete_session(&self, key: &SessionKey) -> Result<()>;

    /// Append an event and apply its state delta
    async fn append_event(&self, key: &SessionKey, event: Event) -> Result<Event>;
}
