//! Model-backed graph tutorials: plain chat, chat with memory, two-step rewrite, expert routing

use std::sync::Arc;

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use serde_json::json;
use tracing::debug;

use super::Workbench;
use crate::console::Console;
use crate::graph::messages::{messages, to_value};
use crate::graph::{
    self, CompiledGraph, GraphError, NodeOutput, Router, State, StateGraph, StateSchema, END,
    MESSAGES, START,
};
use crate::llm::{ChatModel, Message};

const EXIT_WORDS: &[&str] = &["quit", "stop", "exit"];

const ANALYZER_PROMPT: &str = "You will be given a question. Your job is to analyze it, and then \
rewrite it in a simpler manner.
Make sure the rewritten question retains the original meaning but is easier to understand.
IMPORTANT: You are NOT supposed to answer the question, just rewrite it in simpler form. Only \
output the simplified question, nothing else.";

const GENERATOR_PROMPT: &str = "You are an expert in general knowledge. You will be given a \
simplified question.
Your job is to provide a detailed and accurate answer to that question.";

const CLASSIFIER_PROMPT: &str = "You are a question classifier. Analyze the user's question and \
determine if it's about:
- Python programming (code, syntax, libraries, debugging, algorithms in Python context, etc.) \
-> respond with only the word \"python\"
- General knowledge (history, science, math, facts, non-programming topics, etc.) \
-> respond with only the word \"general\"

Output ONLY one word: either \"python\" or \"general\". Nothing else.";

const PYTHON_EXPERT_PROMPT: &str =
    "You are an expert Python programmer. Answer the user's Python-related questions accurately \
    and concisely.";

const GENERAL_EXPERT_PROMPT: &str =
    "You are an expert in general knowledge. Answer the user's general knowledge questions \
    accurately and concisely.";

fn message_input(history: &[Message]) -> State {
    State::from([(MESSAGES.to_string(), to_value(history))])
}

fn first_message(state: &State) -> graph::Result<Message> {
    messages(state, MESSAGES)?
        .into_iter()
        .next()
        .ok_or_else(|| GraphError::InvalidState {
            channel: MESSAGES.to_string(),
            message: "no messages".to_string(),
        })
}

/// One node answering the conversation so far and printing `{label}: {reply}`
fn responder_graph(
    model: Arc<dyn ChatModel>,
    console: Arc<dyn Console>,
    node: &str,
    label: &'static str,
) -> graph::Result<CompiledGraph> {
    StateGraph::new(StateSchema::new().list(MESSAGES))
        .add_node_fn(node, move |state| {
            let model = model.clone();
            let console = console.clone();
            async move {
                let history = messages(&state, MESSAGES)?;
                let reply = model.invoke(&history, &[]).await?;
                console.say(&format!("{}{}", label, reply.content));
                Ok::<_, GraphError>(NodeOutput::new().with_messages(MESSAGES, &[reply]))
            }
        })
        .add_edge(START, node)
        .add_edge(node, END)
        .compile()
}

pub fn chat_graph(
    model: Arc<dyn ChatModel>,
    console: Arc<dyn Console>,
) -> graph::Result<CompiledGraph> {
    responder_graph(model, console, "process_node", "\n Agent response: ")
}

/// Every message is answered on its own
pub async fn chat(bench: &Workbench) -> Result<()> {
    let graph = chat_graph(bench.chat_model(&bench.config.models.groq), bench.console.clone())?;
    while let Some(text) = bench.prompt_until("Enter your message: ", &["exit"]).await? {
        graph.invoke(message_input(&[Message::user(text)])).await?;
    }
    Ok(())
}

pub fn memory_chat_graph(
    model: Arc<dyn ChatModel>,
    console: Arc<dyn Console>,
) -> graph::Result<CompiledGraph> {
    responder_graph(model, console, "LLM", "\nAgent response: ")
}

/// The whole conversation is sent each turn and carried over from the result
pub async fn memory_chat(bench: &Workbench) -> Result<()> {
    let model = bench.chat_model(&bench.config.models.groq);
    let graph = memory_chat_graph(model, bench.console.clone())?;
    let mut history: Vec<Message> = Vec::new();
    let mut prompt = "Enter your message ('quit' to exit): ";

    while let Some(text) = bench.prompt_until(prompt, EXIT_WORDS).await? {
        history.push(Message::user(text));
        let result = graph.invoke(message_input(&history)).await?;
        history = messages(&result, MESSAGES)?;
        debug!("History now holds {} messages", history.len());
        prompt = "\nEnter your message ('quit' to exit): ";
    }
    Ok(())
}

/// Analyzer rewrites the first message only; generator answers the rewrite
pub fn two_step_graph(
    model: Arc<dyn ChatModel>,
    console: Arc<dyn Console>,
) -> graph::Result<CompiledGraph> {
    let (analyzer_model, analyzer_console) = (model.clone(), console.clone());

    StateGraph::new(StateSchema::new().list(MESSAGES))
        .add_node_fn("Question Analyzer", move |state| {
            let model = analyzer_model.clone();
            let console = analyzer_console.clone();
            async move {
                let request = [Message::system(ANALYZER_PROMPT), first_message(&state)?];
                let reply = model.invoke(&request, &[]).await?;
                console.say(&format!("\nAnalyzer response: {}", reply.content));
                let rewrite = Message::assistant(reply.content);
                Ok::<_, GraphError>(NodeOutput::new().with_messages(MESSAGES, &[rewrite]))
            }
        })
        .add_node_fn("Answer Generator", move |state| {
            let model = model.clone();
            let console = console.clone();
            async move {
                let simplified = messages(&state, MESSAGES)?
                    .pop()
                    .map(|m| m.content)
                    .unwrap_or_default();
                let request = [Message::system(GENERATOR_PROMPT), Message::user(simplified)];
                let reply = model.invoke(&request, &[]).await?;
                console.say(&format!("\nGenerator response: {}", reply.content));
                Ok::<_, GraphError>(NodeOutput::new())
            }
        })
        .set_entry_point("Question Analyzer")
        .add_edge("Question Analyzer", "Answer Generator")
        .set_finish_point("Answer Generator")
        .compile()
}

pub async fn two_step(bench: &Workbench) -> Result<()> {
    let graph = two_step_graph(bench.chat_model(&bench.config.models.groq), bench.console.clone())?;
    let mut prompt = "Enter your question ('quit' to exit): ";
    while let Some(text) = bench.prompt_until(prompt, EXIT_WORDS).await? {
        graph.invoke(message_input(&[Message::user(text)])).await?;
        prompt = "\nEnter your question ('quit' to exit): ";
    }
    Ok(())
}

fn expert_node(
    model: Arc<dyn ChatModel>,
    console: Arc<dyn Console>,
    system_prompt: &'static str,
    label: &'static str,
) -> impl Fn(State) -> BoxFuture<'static, graph::Result<NodeOutput>> + Send + Sync + 'static {
    move |state: State| {
        let model = model.clone();
        let console = console.clone();
        async move {
            let mut request = vec![Message::system(system_prompt)];
            request.extend(messages(&state, MESSAGES)?);
            let reply = model.invoke(&request, &[]).await?;
            console.say(&format!("\n{} response: {}", label, reply.content));
            Ok::<_, GraphError>(NodeOutput::new())
        }
        .boxed()
    }
}

/// Classifier node writes `route`; the edge out of it reads that field
pub fn router_graph(
    model: Arc<dyn ChatModel>,
    console: Arc<dyn Console>,
) -> graph::Result<CompiledGraph> {
    let (classifier_model, classifier_console) = (model.clone(), console.clone());

    StateGraph::new(StateSchema::new().list(MESSAGES).channel("route"))
        .add_node_fn("Router agent", move |state| {
            let model = classifier_model.clone();
            let console = classifier_console.clone();
            async move {
                let question = messages(&state, MESSAGES)?
                    .pop()
                    .map(|m| m.content)
                    .unwrap_or_default();
                let request = [Message::system(CLASSIFIER_PROMPT), Message::user(question)];
                let decision = model.invoke(&request, &[]).await?.content.trim().to_lowercase();
                console.say(&format!("\nRouter decision: {}", decision));

                let route = if decision.contains("python") { "python" } else { "general" };
                Ok::<_, GraphError>(NodeOutput::new().with_update("route", json!(route)))
            }
        })
        .add_node_fn(
            "Python Expert",
            expert_node(model.clone(), console.clone(), PYTHON_EXPERT_PROMPT, "Python Expert"),
        )
        .add_node_fn(
            "General Expert",
            expert_node(model, console, GENERAL_EXPERT_PROMPT, "General Expert"),
        )
        .add_edge(START, "Router agent")
        .add_conditional_edges(
            "Router agent",
            Router::by_field("route"),
            [("python", "Python Expert"), ("general", "General Expert")],
        )
        .add_edge("Python Expert", END)
        .add_edge("General Expert", END)
        .compile()
}

pub async fn router(bench: &Workbench) -> Result<()> {
    let graph = router_graph(bench.chat_model(&bench.config.models.groq), bench.console.clone())?;
    let mut prompt = "Enter your question ('quit' to exit): ";
    while let Some(text) = bench.prompt_until(prompt, EXIT_WORDS).await? {
        graph.invoke(message_input(&[Message::user(text)])).await?;
        prompt = "\nEnter your question ('quit' to exit): ";
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::ScriptedModel;
    use crate::tutorials::testing::harness;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_chat_sends_single_message() {
        let model = ScriptedModel::new("scripted").reply("Hi there").reply("Paris");
        let h = harness(
            Config::default(),
            ["hello", "capital of France?", "exit", "ignored"],
            model,
        );
        chat(&h.bench).await.unwrap();

        let requests = h.model().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 1);
        assert!(h.console.output().contains(&"\n Agent response: Paris".to_string()));
    }

    #[tokio::test]
    async fn test_memory_chat_carries_history() {
        let model = ScriptedModel::new("scripted").reply("Hello Ada").reply("Your name is Ada");
        let h = harness(Config::default(), ["I am Ada", "What is my name?", "quit"], model);
        memory_chat(&h.bench).await.unwrap();

        let requests = h.model().requests();
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].messages[1].content, "Hello Ada");
        assert!(h.transcript().contains("\nAgent response: Your name is Ada"));
    }

    #[tokio::test]
    async fn test_two_step_rewrites_then_answers() {
        let model = ScriptedModel::new("scripted")
            .reply("Why is the sky blue?")
            .reply("Rayleigh scattering.");
        let h = harness(Config::default(), ["What makes the firmament azure?"], model);
        two_step(&h.bench).await.unwrap();

        let requests = h.model().requests();
        assert_eq!(requests[0].last_user_text(), Some("What makes the firmament azure?"));
        assert_eq!(requests[1].last_user_text(), Some("Why is the sky blue?"));
        assert_eq!(requests[1].messages.len(), 2);
        assert!(h.transcript().contains("Generator response: Rayleigh scattering."));
    }

    #[tokio::test]
    async fn test_router_picks_expert() {
        let model = ScriptedModel::new("scripted")
            .reply(" Python ")
            .reply("Use a list comprehension.")
            .reply("general")
            .reply("1945.");
        let h = harness(
            Config::default(),
            ["How do I map a list in python?", "When did WW2 end?", "stop"],
            model,
        );
        router(&h.bench).await.unwrap();

        let transcript = h.transcript();
        assert!(transcript.contains("Router decision: python"));
        assert!(transcript.contains("Python Expert response: Use a list comprehension."));
        assert!(transcript.contains("General Expert response: 1945."));

        let requests = h.model().requests();
        assert_eq!(requests[1].system_text(), Some(PYTHON_EXPERT_PROMPT));
        assert_eq!(requests[3].system_text(), Some(GENERAL_EXPERT_PROMPT));
    }
}
