//! RAG agent over a paged document: chunk, embed, retrieve through a tool

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use super::Workbench;
use crate::console::Console;
use crate::graph::messages::{last_message, to_value};
use crate::graph::{
    self, CompiledGraph, GraphError, ModelNode, NodeOutput, Router, State, StateGraph, StateSchema,
    END, MESSAGES,
};
use crate::llm::{ChatModel, Message};
use crate::rag::{load_pages, Document, Embedder, Retriever, TextSplitter, VectorStore};
use crate::tools::{RetrieverTool, ToolRegistry};

const SYSTEM_PROMPT: &str = "You are an intelligent AI assistant who answers questions about the \
SkillX Quant Finance Session 1 slides based on the PDF document loaded into your knowledge base.
Use the retriever tool available to answer questions about the SkillX Quant Finance Session 1 \
slides. You can make multiple calls if needed.
If you need to look up some information before asking a follow up question, you are allowed to \
do that!
PLEASE always cite the specific parts of the documents you use in your answers.";

/// Split pages into chunks and embed them into a fresh store
pub async fn build_store(
    pages: &[Document],
    splitter: &TextSplitter,
    embedder: &dyn Embedder,
    collection: &str,
) -> Result<VectorStore> {
    let chunks = splitter.split_documents(pages);
    info!("Split {} pages into {} chunks", pages.len(), chunks.len());
    let mut store = VectorStore::new(collection);
    store
        .add_documents(chunks, embedder)
        .await
        .context("Failed to embed document chunks")?;
    Ok(store)
}

/// Model node and a tool node that reports every retrieval on the console
pub fn rag_graph(
    model: Arc<dyn ChatModel>,
    console: Arc<dyn Console>,
    tools: ToolRegistry,
) -> graph::Result<CompiledGraph> {
    let agent = ModelNode::new("LLM_agent", model)
        .with_system_prompt(SYSTEM_PROMPT)
        .with_tools(tools.clone());

    StateGraph::new(StateSchema::new().list(MESSAGES))
        .add_node(agent)
        .add_node_fn("retriever_agent", move |state| {
            let tools = tools.clone();
            let console = console.clone();
            async move {
                let Some(last) = last_message(&state, MESSAGES)? else {
                    return Ok::<_, GraphError>(NodeOutput::new());
                };
                let mut results = Vec::with_capacity(last.tool_calls.len());
                for call in &last.tool_calls {
                    let query = call
                        .args
                        .get("query")
                        .and_then(Value::as_str)
                        .unwrap_or("No query provided");
                    console.say(&format!("Calling Tool: {} with query: {}", call.name, query));

                    let result = tools.execute(call).await;
                    if tools.get(&call.name).is_none() {
                        console.say(&format!("\nTool: {} does not exist.", call.name));
                    } else {
                        console.say(&format!("Result length: {}", result.content.chars().count()));
                    }
                    results.push(result);
                }
                console.say("Tools Execution Complete. Back to the model!");
                Ok(NodeOutput::new().with_messages(MESSAGES, &results))
            }
        })
        .set_entry_point("LLM_agent")
        .add_edge("retriever_agent", "LLM_agent")
        .add_conditional_edges(
            "LLM_agent",
            Router::has_tool_calls(MESSAGES, "continue", "end"),
            [("continue", "retriever_agent"), ("end", END)],
        )
        .compile()
}

pub async fn rag(bench: &Workbench, document: &Path) -> Result<()> {
    let pages = match load_pages(document) {
        Ok(pages) => {
            bench.say(&format!(
                "Successfully loaded {} pages from the PDF document.",
                pages.len()
            ));
            pages
        },
        Err(e) => {
            bench.say(&format!("Error loading PDF document: {}", e));
            return Err(e.into());
        },
    };

    let cfg = &bench.config.rag;
    let splitter = TextSplitter::new(cfg.chunk_size, cfg.chunk_overlap)?;
    let embedder = bench.models.embedder();
    let store = build_store(&pages, &splitter, embedder.as_ref(), &cfg.collection).await?;
    store.save(&cfg.persist_dir)?;
    bench.say("Successfully created the vector store!");

    let retriever = Arc::new(Retriever::new(Arc::new(store), embedder, cfg.top_k));
    let tools = ToolRegistry::empty().with(RetrieverTool::new(retriever));
    let model = bench.models.chat_model(&bench.config.models.groq, Some(0.0));
    let graph = rag_graph(model, bench.console.clone(), tools)?
        .with_recursion_limit(bench.config.general.recursion_limit);

    bench.say("\n=== RAG AGENT===");
    while let Some(question) = bench
        .prompt_until("\nWhat is your question?: ", &["exit", "quit"])
        .await?
    {
        let input = State::from([(MESSAGES.to_string(), to_value(&[Message::user(question)]))]);
        let result = graph.invoke(input).await?;
        bench.say("\n=== ANSWER ===");
        if let Some(answer) = last_message(&result, MESSAGES)? {
            bench.say(&answer.content);
        }
    }
    Ok(())
}
