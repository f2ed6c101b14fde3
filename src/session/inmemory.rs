use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::{
    strip_temp_keys, Event, Result, Session, SessionError, SessionKey, SessionService, StateMap,
};

/// Session service holding everything in process memory
#[derive(Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<String>,
        mut state: StateMap,
    ) -> Result<Session> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let key = SessionKey::new(app_name, user_id, &session_id);

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(&key) {
            return Err(SessionError::AlreadyExists(key));
        }

        strip_temp_keys(&mut state);
        let session = Session {
            id: session_id,
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            state,
            events: Vec::new(),
            last_update_time: Utc::now(),
        };
        debug!("Created session {}", key);
        sessions.insert(key, session.clone());
        Ok(session)
    }

    async fn get_session(&self, key: &SessionKey) -> Result<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(key.clone()))
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<Session> = sessions
            .values()
            .filter(|s| s.app_name == app_name && s.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.last_update_time
                .cmp(&b.last_update_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(found)
    }

    async fn delete_session(&self, key: &SessionKey) -> Result<()> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| SessionError::NotFound(key.clone()))
    }

    async fn append_event(&self, key: &SessionKey, mut event: Event) -> Result<Event> {
        strip_temp_keys(&mut event.state_delta);

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions
            .get_mut(key)
            .ok_or_else(|| SessionError::NotFound(key.clone()))?;

        session
            .state
            .extend(event.state_delta.iter().map(|(k, v)| (k.clone(), v.clone())));
        session.last_update_time = event.timestamp;
        session.events.push(event.clone());
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;
    use serde_json::json;

    const APP: &str = "Newton Info Bot";
    const USER: &str = "student";

    #[tokio::test]
    async fn test_create_and_get() {
        let service = InMemorySessionService::new();
        let state = StateMap::from([
            ("Mathematician".to_string(), json!("Isaac Newton")),
            ("temp:scratch".to_string(), json!(1)),
        ]);
        let created = service.create_session(APP, USER, None, state).await.unwrap();
        assert!(Uuid::parse_str(&created.id).is_ok());
        assert!(!created.state.contains_key("temp:scratch"));

        let fetched = service.get_session(&created.key()).await.unwrap();
        assert_eq!(fetched.state["Mathematician"], "Isaac Newton");
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let service = InMemorySessionService::new();
        service
            .create_session(APP, USER, Some("s1".into()), StateMap::new())
            .await
            .unwrap();
        let err = service
            .create_session(APP, USER, Some("s1".into()), StateMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_append_applies_delta() {
        let service = InMemorySessionService::new();
        let session = service
            .create_session(APP, USER, Some("s1".into()), StateMap::new())
            .await
            .unwrap();
        let key = session.key();

        let event = Event::new("inv-1", "paragraph_agent", Message::assistant("text"))
            .with_state_delta("para", json!("text"))
            .with_state_delta("temp:draft", json!("x"));
        let stored = service.append_event(&key, event).await.unwrap();
        assert!(!stored.state_delta.contains_key("temp:draft"));

        let session = service.get_session(&key).await.unwrap();
        assert_eq!(session.events.len(), 1);
        assert_eq!(session.state["para"], "text");
        assert!(!session.state.contains_key("temp:draft"));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let service = InMemorySessionService::new();
        service.create_session(APP, USER, Some("a".into()), StateMap::new()).await.unwrap();
        service.create_session(APP, USER, Some("b".into()), StateMap::new()).await.unwrap();
        service.create_session(APP, "other", None, StateMap::new()).await.unwrap();

        assert_eq!(service.list_sessions(APP, USER).await.unwrap().len(), 2);

        let key = SessionKey::new(APP, USER, "a");
        service.delete_session(&key).await.unwrap();
        assert!(matches!(
            service.get_session(&key).await,
            Err(SessionError::NotFound(_))
        ));
        assert!(service.delete_session(&key).await.is_err());
        assert!(service
            .append_event(&key, Event::user("inv", "hello"))
            .await
            .is_err());
    }
}
