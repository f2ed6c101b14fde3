//! Drafter: edit a document through `update` and finish with `save`

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};

use super::Workbench;
use crate::console::Console;
use crate::graph::messages::messages;
use crate::graph::{
    self, CompiledGraph, GraphError, NodeOutput, State, StateGraph, StateSchema, ToolNode, END,
    MESSAGES,
};
use crate::llm::{ChatModel, Message, Role};
use crate::tools::{DocumentBuffer, SaveTool, ToolRegistry, UpdateTool};

/// Set once the user has nothing more to say
const FINISHED: &str = "finished";

fn system_prompt(document: &str) -> String {
    format!(
        "You are Drafter, a helpful writing assistant. You are going to help the user update and \
        modify documents.

- If the user wants to update or modify content, use the 'update' tool with the complete updated \
content.
- If the user wants to save and FINISH, you need to use the 'save' tool.
- Make sure to always show the current document state after modifications.

The current document content is:{}",
        document
    )
}

/// A save result ends the session
fn is_save_result(message: &Message) -> bool {
    let content = message.content.to_lowercase();
    message.role == Role::Tool && content.contains("saved") && content.contains("document")
}

pub fn drafter_graph(
    model: Arc<dyn ChatModel>,
    console: Arc<dyn Console>,
    buffer: DocumentBuffer,
    output_dir: &Path,
) -> graph::Result<CompiledGraph> {
    let tools = ToolRegistry::empty()
        .with(UpdateTool::new(buffer.clone()))
        .with(SaveTool::new(buffer.clone(), output_dir));
    let specs = tools.specs();
    let tool_console = console.clone();

    StateGraph::new(
        StateSchema::new()
            .list(MESSAGES)
            .channel_with_default(FINISHED, json!(false)),
    )
    .add_node_fn("drafter_agent", move |state| {
        let model = model.clone();
        let console = console.clone();
        let buffer = buffer.clone();
        let specs = specs.clone();
        async move {
            let history = messages(&state, MESSAGES)?;
            if history.is_empty() {
                console.say(
                    "\nHello! I'm Drafter, your assistant for drafting documents. \
                     How can I help you today?",
                );
            }
            let input = console
                .read_line("\nWhat would you like to do with the document? ")
                .await
                .map_err(anyhow::Error::from)?;
            let Some(input) = input else {
                return Ok::<_, GraphError>(NodeOutput::new().with_update(FINISHED, true));
            };

            let user = Message::user(input);
            let mut request = vec![Message::system(system_prompt(&buffer.get()))];
            request.extend(history);
            request.push(user.clone());

            let reply = model.invoke(&request, &specs).await?;
            if !reply.content.is_empty() {
                console.say(&format!("\nAgent response: {}", reply.content));
            }
            Ok(NodeOutput::new().with_messages(MESSAGES, &[user, reply]))
        }
    })
    .add_node(ToolNode::new("tools", tools).with_observer(move |_, result| {
        tool_console.say(&format!("\n TOOL RESULT: {} \n", result.content));
    }))
    .set_entry_point("drafter_agent")
    .add_conditional_edges(
        "drafter_agent",
        |state: &State| {
            if state.get(FINISHED).and_then(Value::as_bool) == Some(true) {
                "end".to_string()
            } else {
                "tools".to_string()
            }
        },
        [("tools", "tools"), ("end", END)],
    )
    .add_conditional_edges(
        "tools",
        |state: &State| {
            let saved = messages(state, MESSAGES)
                .ok()
                .and_then(|m| m.last().map(is_save_result))
                .unwrap_or(false);
            let route = if saved { "end" } else { "continue" };
            route.to_string()
        },
        [("continue", "drafter_agent"), ("end", END)],
    )
    .compile()
}

/// Runs one drafting session; returns the final document
pub async fn drafter(bench: &Workbench) -> Result<String> {
    bench.say("\n ===== DRAFTER =====");

    let buffer = DocumentBuffer::new();
    let graph = drafter_graph(
        bench.chat_model(&bench.config.models.groq),
        bench.console.clone(),
        buffer.clone(),
        &bench.config.drafter.output_dir,
    )?
    .with_recursion_limit(bench.config.general.recursion_limit);

    graph.invoke(State::new()).await?;

    bench.say("\n ===== DRAFTER FINISHED =====");
    Ok(buffer.get())
}
