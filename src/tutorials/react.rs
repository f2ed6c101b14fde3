//! ReAct agent: model and arithmetic tools in a loop until the model stops calling tools

use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;

use super::Workbench;
use crate::graph::messages::{last_message, to_value};
use crate::graph::{
    self, CompiledGraph, ModelNode, Router, State, StateGraph, StateSchema, ToolNode, END, MESSAGES,
};
use crate::llm::{ChatModel, Message, Role};
use crate::tools::{arithmetic_tools, ToolRegistry};

const SYSTEM_PROMPT: &str = "You are a helpful AI agent. \
When you use tools to perform calculations, \
ALWAYS include the calculation results in your final response to the user. \
Be complete and thorough in your answers.";

pub fn arithmetic_registry() -> ToolRegistry {
    arithmetic_tools()
        .into_iter()
        .fold(ToolRegistry::empty(), |registry, tool| registry.with(tool))
}

pub fn react_graph(model: Arc<dyn ChatModel>, tools: ToolRegistry) -> graph::Result<CompiledGraph> {
    StateGraph::new(StateSchema::new().list(MESSAGES))
        .add_node(
            ModelNode::new("agent", model)
                .with_system_prompt(SYSTEM_PROMPT)
                .with_tools(tools.clone()),
        )
        .add_node(ToolNode::new("tools", tools))
        .set_entry_point("agent")
        .add_conditional_edges(
            "agent",
            Router::has_tool_calls(MESSAGES, "continue", "end"),
            [("continue", "tools"), ("end", END)],
        )
        .add_edge("tools", "agent")
        .compile()
}

/// Banner and body of a message, tool calls listed under the text
pub fn pretty_message(message: &Message) -> String {
    let title = match message.role {
        Role::System => "System",
        Role::User => "Human",
        Role::Assistant => "Ai",
        Role::Tool => "Tool",
    };
    let mut out = format!("{:=^80}\n", format!(" {} Message ", title));
    if let Some(name) = &message.name {
        out.push_str(&format!("Name: {}\n", name));
    }
    if !message.content.is_empty() {
        out.push_str(&format!("\n{}", message.content));
    }
    if message.has_tool_calls() {
        out.push_str("Tool Calls:");
        for call in &message.tool_calls {
            out.push_str(&format!(
                "\n  {} ({})\n Call ID: {}\n  Args:",
                call.name, call.id, call.id
            ));
            if let Some(args) = call.args.as_object() {
                for (key, value) in args {
                    out.push_str(&format!("\n    {}: {}", key, value));
                }
            }
        }
    }
    out
}

pub async fn react(bench: &Workbench) -> Result<()> {
    let model = bench.chat_model(&bench.config.models.groq);
    let graph = react_graph(model, arithmetic_registry())?
        .with_recursion_limit(bench.config.general.recursion_limit);

    while let Some(query) = bench.prompt_until("Enter your question here: ", &["exit"]).await? {
        let input = State::from([(MESSAGES.to_string(), to_value(&[Message::user(query)]))]);
        let mut stream = Box::pin(graph.stream(input));
        while let Some(state) = stream.next().await {
            if let Some(message) = last_message(&state?, MESSAGES)? {
                bench.say(&pretty_message(&message));
            }
        }
    }
    Ok(())
}
