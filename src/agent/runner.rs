use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::{AgentError, LlmAgent, Result};
use crate::llm::Message;
use crate::session::{Event, SessionKey, SessionService};
use crate::template::inject_state;

const DEFAULT_MAX_STEPS: usize = 10;

/// Runs an agent against sessions of one app
pub struct Runner {
    agent: LlmAgent,
    app_name: String,
    session_service: Arc<dyn SessionService>,
    max_steps: usize,
}

impl Runner {
    pub fn new(
        agent: LlmAgent,
        app_name: impl Into<String>,
        session_service: Arc<dyn SessionService>,
    ) -> Self {
        Self {
            agent,
            app_name: app_name.into(),
            session_service,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Model turns allowed per user message
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn session_service(&self) -> &Arc<dyn SessionService> {
        &self.session_service
    }

    /// Handle one user message; returns the events produced, user event first.
    ///
    /// The session must already exist.
    pub async fn run(&self, user_id: &str, session_id: &str, text: &str) -> Result<Vec<Event>> {
        let key = SessionKey::new(&self.app_name, user_id, session_id);
        let invocation_id = format!("e-{}", Uuid::new_v4());
        let agent = &self.agent;

        let user_event = self
            .session_service
            .append_event(&key, Event::user(&invocation_id, text))
            .await?;
        let mut events = vec![user_event];

        let session = self.session_service.get_session(&key).await?;
        let instruction = inject_state(&agent.instruction, &session.state)?;
        let mut messages = Vec::with_capacity(session.events.len() + 1);
        messages.push(Message::system(agent.system_prompt(instruction)));
        messages.extend(session.events.iter().map(|e| e.content.clone()));

        let tool_specs = agent.tools.specs();
        info!(
            "Running agent {} ({}) for session {}",
            agent.name,
            agent.model.name(),
            key
        );

        for step in 0..self.max_steps {
            let reply = agent.model.invoke(&messages, &tool_specs).await?;
            debug!(
                "Step {}: {} chars, {} tool calls",
                step,
                reply.content.len(),
                reply.tool_calls.len()
            );

            if !reply.has_tool_calls() {
                let mut event = Event::new(&invocation_id, &agent.name, reply);
                if let Some(output_key) = &agent.output_key {
                    let value = agent.output_value(&event.content.content)?;
                    event = event.with_state_delta(output_key.clone(), value);
                }
                events.push(self.session_service.append_event(&key, event).await?);
                return Ok(events);
            }

            messages.push(reply.clone());
            let calls = reply.tool_calls.clone();
            events.push(
                self.session_service
                    .append_event(&key, Event::new(&invocation_id, &agent.name, reply))
                    .await?,
            );

            for call in &calls {
                let result = agent.tools.execute(call).await;
                messages.push(result.clone());
                events.push(
                    self.session_service
                        .append_event(&key, Event::new(&invocation_id, &agent.name, result))
                        .await?,
                );
            }
        }

        Err(AgentError::StepLimit {
            agent: agent.name.clone(),
            steps: self.max_steps,
        })
    }

    /// `run`, returning only the text of the final response
    pub async fn ask(&self, user_id: &str, session_id: &str, text: &str) -> Result<String> {
        let events = self.run(user_id, session_id, text).await?;
        Ok(events
            .iter()
            .rev()
            .find(|e| e.is_final_response())
            .map(|e| e.content.content.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Role, ScriptedModel, ToolCall};
    use crate::session::{InMemorySessionService, StateMap};
    use crate::tools::{object_schema, string_prop, FactorialTool};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn service_with_session(state: StateMap) -> Arc<InMemorySessionService> {
        let service = Arc::new(InMemorySessionService::new());
        service
            .create_session("app", "u1", Some("s1".into()), state)
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let model = Arc::new(
            ScriptedModel::new("scripted")
                .call_tools(vec![ToolCall::new("c1", "factorial", json!({"a": 5}))])
                .reply("5! is 120"),
        );
        let agent = LlmAgent::new("tool_agent", model.clone())
            .with_instruction("Use the provided tools.")
            .with_tool(FactorialTool);
        let service = service_with_session(StateMap::new()).await;
        let runner = Runner::new(agent, "app", service.clone());

        let events = runner.run("u1", "s1", "what is 5!?").await.unwrap();
        let roles: Vec<Role> = events.iter().map(|e| e.content.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert_eq!(events[2].content.content, "120");
        assert!(events[3].is_final_response());

        let requests = model.requests();
        assert_eq!(requests[0].tools, vec!["factorial"]);
        assert_eq!(requests[1].messages.last().unwrap().content, "120");

        let session = service.get_session(&SessionKey::new("app", "u1", "s1")).await.unwrap();
        assert_eq!(session.events.len(), 4);
    }

    #[tokio::test]
    async fn test_instruction_uses_state_and_history() {
        let model = Arc::new(ScriptedModel::new("scripted").reply("Hi!").reply("Newton's Method"));
        let agent = LlmAgent::new("qa", model.clone())
            .with_instruction("Name in {Mathematician}");
        let state = StateMap::from([("Mathematician".to_string(), json!("Isaac Newton"))]);
        let runner = Runner::new(agent, "app", service_with_session(state).await);

        runner.ask("u1", "s1", "hello").await.unwrap();
        let answer = runner.ask("u1", "s1", "numerical method?").await.unwrap();
        assert_eq!(answer, "Newton's Method");

        let second = &model.requests()[1];
        assert_eq!(second.system_text(), Some("Name in Isaac Newton"));
        // system + user + assistant + user
        assert_eq!(second.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_output_key_updates_state() {
        let model = Arc::new(ScriptedModel::new("scripted").reply(r#"{"para": "Short text."}"#));
        let agent = LlmAgent::new("paragraph_agent", model)
            .with_output_schema(
                object_schema()
                    .property("para", string_prop("Paragraph"), true)
                    .build(),
            )
            .with_output_key("para");
        let service = service_with_session(StateMap::new()).await;
        let runner = Runner::new(agent, "app", service.clone());

        runner.run("u1", "s1", "the ocean").await.unwrap();
        let session = service.get_session(&SessionKey::new("app", "u1", "s1")).await.unwrap();
        assert_eq!(session.state["para"], json!({"para": "Short text."}));
    }

    #[tokio::test]
    async fn test_step_limit() {
        let call = ToolCall::new("c", "factorial", json!({"a": 1}));
        let model = Arc::new(
            ScriptedModel::new("scripted")
                .call_tools(vec![call.clone()])
                .call_tools(vec![call]),
        );
        let agent = LlmAgent::new("looper", model).with_tool(FactorialTool);
        let runner = Runner::new(agent, "app", service_with_session(StateMap::new()).await)
            .with_max_steps(2);
        let err = runner.run("u1", "s1", "go").await.unwrap_err();
        assert!(matches!(err, AgentError::StepLimit { steps: 2, .. }));
    }

    #[tokio::test]
    async fn test_missing_instruction_variable() {
        let agent = LlmAgent::new("qa", Arc::new(ScriptedModel::new("scripted")))
            .with_instruction("Laws in {Famous_Formulae}");
        let runner = Runner::new(agent, "app", service_with_session(StateMap::new()).await);
        assert!(matches!(
            runner.run("u1", "s1", "hi").await,
            Err(AgentError::Template(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let agent = LlmAgent::new("qa", Arc::new(ScriptedModel::new("scripted")));
        let runner = Runner::new(agent, "app", Arc::new(InMemorySessionService::new()));
        assert!(matches!(
            runner.run("u1", "nope", "hi").await,
            Err(AgentError::Session(_))
        ));
    }
}
