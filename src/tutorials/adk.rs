//! Single-agent tutorials run through sessions: greeting, tools, structured output, state

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::info;

use super::Workbench;
use crate::agent::{LlmAgent, Runner};
use crate::pipelines::word_count;
use crate::session::{InMemorySessionService, SessionKey, SessionService, StateMap};
use crate::template::render_value;
use crate::tools::{object_schema, string_prop, CurrentTimeTool, FactorialTool, FortunateWheelTool};

const EXIT_WORDS: &[&str] = &["exit", "quit"];
const DEFAULT_USER: &str = "user";

const GREETING_INSTRUCTION: &str = "You are a helpful assistant that greets the user.
Ask for the user's name and greet them by name.";

const TOOL_INSTRUCTION: &str = "You are a helpful AI assistant. Use the provided tools to return \
results to user queries.
Provided tools= factorial AND get_current_time";

const WHEEL_INSTRUCTION: &str = "You are an AI assistant, and you have to use the tool provided \
to display the good outcome.
After choosing the tool, you have to DISPLAY it as well, in the output.
CRITICAL: You MUST reply to the user with the result you received from the tool.
DO NOT STAY SILENT, actually DISPLAY the outcome.

Provided tools: fortunate_wheel";

const PARAGRAPH_INSTRUCTION: &str = "You are an AI assistant whose job is to write a ~50 word \
paragraph on a topic which will be provided to you.
General instructions:
Make use of proper grammar and writing skills for these paragraphs.
Do not exceed 65 words in any paragraph, and do not go below 45 words.

IMPORTANT: You will output the result in a valid JSON format matching the structure given below
{
    \"para\": \"the short descriptive paragraph here\"
}

DO NOT OUTPUT ANYTHING OTHER the specified JSON response.";

const QA_INSTRUCTION: &str = "You are a helpful AI assistant.
You will be given a state, which will contain the name of a mathematician and his famous laws.
The variables in which they are stored are:
Name in {Mathematician}
Laws in {Famous_Formulae}
You will answer the user's questions based on the provided information.
You will ONLY return the name of the law specifically asked, not all of them.";

const NEWTON_APP: &str = "Newton Info Bot";
const NEWTON_USER: &str = "Vedanga Gupta";
const NEWTON_LAWS: &str = "1. Newton's Laws of motion (set of 3 laws in classical mechanics).
2. Newton's Law of Gravitation (fundamental law of gravity).
3. Newton's Method (core numerical analysis formula).
4. Newton's Law of Cooling (thermodynamics).";

fn runner(bench: &Workbench, agent: LlmAgent, app_name: &str) -> Runner {
    let sessions: Arc<dyn SessionService> = Arc::new(InMemorySessionService::new());
    Runner::new(agent, app_name, sessions).with_max_steps(bench.config.general.max_agent_steps)
}

/// Chat with one agent in a fresh session until an exit word or end of input
async fn converse(bench: &Workbench, runner: &Runner, agent_name: &str) -> Result<()> {
    let session = runner
        .session_service()
        .create_session(agent_name, DEFAULT_USER, None, StateMap::new())
        .await?;
    info!("Started session {} with {}", session.id, agent_name);

    while let Some(text) = bench.prompt_until("\nYou: ", EXIT_WORDS).await? {
        let reply = runner.ask(DEFAULT_USER, &session.id, &text).await?;
        bench.say(&format!("[{}]: {}", agent_name, reply));
    }
    Ok(())
}

pub fn greeting_agent(bench: &Workbench) -> LlmAgent {
    LlmAgent::new("greeting_agent", bench.chat_model(&bench.config.models.gemini))
        .with_description("Greeting Agent")
        .with_instruction(GREETING_INSTRUCTION)
}

pub async fn greeting(bench: &Workbench) -> Result<()> {
    let agent = greeting_agent(bench);
    converse(bench, &runner(bench, agent, "greeting_agent"), "greeting_agent").await
}

pub fn tool_agent(bench: &Workbench) -> LlmAgent {
    LlmAgent::new("tool_agent", bench.chat_model(&bench.config.models.gemini))
        .with_description("Agent which uses given tools")
        .with_instruction(TOOL_INSTRUCTION)
        .with_tool(FactorialTool)
        .with_tool(CurrentTimeTool)
}

pub async fn tools(bench: &Workbench) -> Result<()> {
    let agent = tool_agent(bench);
    converse(bench, &runner(bench, agent, "tool_agent"), "tool_agent").await
}

pub fn wheel_agent(bench: &Workbench) -> LlmAgent {
    LlmAgent::new("wheel_fortunate_agent", bench.chat_model(&bench.config.models.gemini_lite))
        .with_description("Agent which spins a wheel and chooses and displays a good outcome.")
        .with_instruction(WHEEL_INSTRUCTION)
        .with_tool(FortunateWheelTool::default())
}

pub async fn wheel(bench: &Workbench) -> Result<()> {
    let agent = wheel_agent(bench);
    converse(bench, &runner(bench, agent, "wheel_fortunate_agent"), "wheel_fortunate_agent").await
}

pub fn paragraph_agent(bench: &Workbench) -> LlmAgent {
    let schema = object_schema()
        .property(
            "para",
            string_prop(
                "Write a short 50 word paragraph on the topic provided to you. \
                 It should be well formatted, and should use good language.",
            ),
            true,
        )
        .build();
    LlmAgent::new("paragraph_agent", bench.chat_model(&bench.config.models.gemini_lite))
        .with_description("Paragraph writing Agent")
        .with_instruction(PARAGRAPH_INSTRUCTION)
        .with_output_schema(schema)
        .with_output_key("para")
}

/// Each topic becomes a paragraph stored under `para`; prints it with its word count
pub async fn paragraph(bench: &Workbench) -> Result<()> {
    let runner = runner(bench, paragraph_agent(bench), "paragraph_agent");
    let session = runner
        .session_service()
        .create_session("paragraph_agent", DEFAULT_USER, None, StateMap::new())
        .await?;
    let key = session.key();

    while let Some(topic) = bench.prompt_until("\nTopic: ", EXIT_WORDS).await? {
        runner.run(DEFAULT_USER, &session.id, &topic).await?;
        let state = runner.session_service().get_session(&key).await?.state;
        let para = state
            .get("para")
            .and_then(|v| v.get("para"))
            .and_then(Value::as_str)
            .context("paragraph agent stored no paragraph")?;
        bench.say(&format!("\n{}", para));
        bench.say(&format!("\nWord count: {}", word_count(para)));
    }
    Ok(())
}

pub fn question_answer_agent(bench: &Workbench) -> LlmAgent {
    LlmAgent::new("question_answer_agent", bench.chat_model(&bench.config.models.gemini_lite))
        .with_description("Question answering agent")
        .with_instruction(QA_INSTRUCTION)
}

/// One question answered from session state, then the session is dumped
pub async fn session_qa(bench: &Workbench) -> Result<()> {
    let sessions: Arc<dyn SessionService> = Arc::new(InMemorySessionService::new());
    let initial_state = StateMap::from([
        ("Mathematician".to_string(), json!("Isaac Newton")),
        ("Famous_Formulae".to_string(), json!(NEWTON_LAWS)),
    ]);
    let session = sessions
        .create_session(NEWTON_APP, NEWTON_USER, None, initial_state)
        .await?;
    bench.say("Created a new session!");
    bench.say(&format!("\tSession ID: {}", session.id));

    let runner = Runner::new(question_answer_agent(bench), NEWTON_APP, sessions.clone())
        .with_max_steps(bench.config.general.max_agent_steps);

    let question = bench
        .read_line("Ask your question about Newton's famous laws:")
        .await?;
    let Some(question) = question else {
        return Ok(());
    };
    for event in runner.run(NEWTON_USER, &session.id, &question).await? {
        if event.is_final_response() && !event.content.content.is_empty() {
            bench.say(&format!("Final Response: {}", event.content.content));
        }
    }

    bench.say("==== Session Event Exploration ====");
    let session = sessions
        .get_session(&SessionKey::new(NEWTON_APP, NEWTON_USER, &session.id))
        .await?;

    bench.say("=== Final Session State ===");
    let mut entries: Vec<_> = session.state.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in entries {
        bench.say(&format!("{}: {}", key, render_value(value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::{ScriptedModel, ToolCall};
    use crate::tutorials::testing::harness;

    #[tokio::test]
    async fn test_tool_agent_answers_with_factorial() {
        let model = ScriptedModel::new("scripted")
            .call_tools(vec![ToolCall::new("c1", "factorial", json!({"a": 5}))])
            .reply("5! is 120");
        let h = harness(Config::default(), ["what is 5 factorial?", "exit"], model);
        tools(&h.bench).await.unwrap();

        assert!(h.transcript().contains("[tool_agent]: 5! is 120"));
        let requests = h.model().requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].system_text().unwrap().contains("factorial AND get_current_time"));
        let tool_result = requests[1].messages.last().unwrap();
        assert_eq!(tool_result.content, "120");
    }

    #[tokio::test]
    async fn test_greeting_keeps_history() {
        let model = ScriptedModel::new("scripted")
            .reply("Hello! What is your name?")
            .reply("Nice to meet you, Ada!");
        let h = harness(Config::default(), ["hi", "I am Ada"], model);
        greeting(&h.bench).await.unwrap();

        let requests = h.model().requests();
        assert_eq!(requests[1].messages.len(), 4);
        assert!(h.transcript().contains("Nice to meet you, Ada!"));
    }

    #[tokio::test]
    async fn test_paragraph_word_count() {
        let model = ScriptedModel::new("scripted").reply(r#"{"para": "Rust is fast and safe."}"#);
        let h = harness(Config::default(), ["Rust"], model);
        paragraph(&h.bench).await.unwrap();

        let transcript = h.transcript();
        assert!(transcript.contains("Rust is fast and safe."));
        assert!(transcript.contains("Word count: 5"));
        assert!(h.model().requests()[0].system_text().unwrap().contains("\"para\": \"the short"));
    }

    #[tokio::test]
    async fn test_session_qa_renders_state() {
        let model = ScriptedModel::new("scripted").reply("Newton's Law of Cooling");
        let h = harness(Config::default(), ["Which law covers heat?"], model);
        session_qa(&h.bench).await.unwrap();

        let output = h.console.output();
        assert_eq!(output[0], "Created a new session!");
        assert!(output[1].starts_with("\tSession ID: "));
        assert!(output.contains(&"Final Response: Newton's Law of Cooling".to_string()));
        assert!(output.contains(&"Mathematician: Isaac Newton".to_string()));

        let system = h.model().requests()[0].system_text().unwrap().to_string();
        assert!(system.contains("Name in Isaac Newton"));
        assert!(system.contains("Newton's Method"));
    }
}
