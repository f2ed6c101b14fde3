//! Question answering over restaurant reviews with a persisted vector store

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use super::Workbench;
use crate::llm::{ChatModel, Message};
use crate::rag::{load_reviews_csv, Document, Embedder, Retriever, VectorStore};
use crate::template::inject_state;

const PROMPT_TEMPLATE: &str = "You are an expert in answering questions about a pizza restaurant.
Here are some reviews: {reviews}
Answer the following question based on the reviews: {question}";

/// Reuse the saved collection, or embed the CSV and save it
pub async fn open_store(
    bench: &Workbench,
    csv_path: &Path,
    embedder: &dyn Embedder,
) -> Result<VectorStore> {
    let cfg = &bench.config.reviews;
    if let Some(store) = VectorStore::load(&cfg.persist_dir, &cfg.collection)? {
        info!("Loaded {} reviews from {}", store.len(), cfg.persist_dir.display());
        return Ok(store);
    }

    let documents = load_reviews_csv(csv_path)?;
    let mut store = VectorStore::new(&cfg.collection);
    store
        .add_documents(documents, embedder)
        .await
        .context("Failed to embed reviews")?;
    let path = store.save(&cfg.persist_dir)?;
    info!("Saved {} reviews to {}", store.len(), path.display());
    Ok(store)
}

fn format_reviews(reviews: &[Document]) -> String {
    reviews
        .iter()
        .map(|doc| format!("\n- {}", doc.content))
        .collect()
}

/// Retrieve reviews for `question` and answer from them
pub async fn answer(
    model: &dyn ChatModel,
    retriever: &Retriever,
    question: &str,
) -> Result<String> {
    let reviews = retriever.invoke(question).await?;
    let values = HashMap::from([
        ("reviews".to_string(), json!(format_reviews(&reviews))),
        ("question".to_string(), json!(question)),
    ]);
    let prompt = inject_state(PROMPT_TEMPLATE, &values)?;
    let reply = model.invoke(&[Message::user(prompt)], &[]).await?;
    Ok(reply.content)
}

pub async fn reviews(bench: &Workbench, csv_path: &Path) -> Result<()> {
    let embedder = bench.models.embedder();
    let store = open_store(bench, csv_path, embedder.as_ref()).await?;
    let retriever = Retriever::new(Arc::new(store), embedder, bench.config.reviews.top_k);
    let model = bench.chat_model(&bench.config.models.local);

    while let Some(question) = bench
        .prompt_until("Ask a question about the pizza restaurant (q to quit): ", &["q"])
        .await?
    {
        let result = answer(model.as_ref(), &retriever, &question).await?;
        bench.say(&format!("\n{}", result));
    }
    Ok(())
}
