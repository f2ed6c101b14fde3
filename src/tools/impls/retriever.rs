//! Vector-store lookup exposed as a tool

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::rag::{Document, Retriever};
use crate::tools::{object_schema, parse_params, string_prop, Result, Tool, ToolError};

const NO_RESULTS: &str = "No relevant information found in the document.";

pub struct RetrieverTool {
    retriever: Arc<Retriever>,
}

impl RetrieverTool {
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self { retriever }
    }
}

#[derive(Debug, Deserialize)]
struct RetrieverParams {
    query: String,
}

fn format_chunks(docs: &[Document]) -> String {
    if docs.is_empty() {
        return NO_RESULTS.to_string();
    }
    docs.iter()
        .enumerate()
        .map(|(i, doc)| format!("Chunk {}:\n{}\n", i + 1, doc.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for RetrieverTool {
    fn name(&self) -> &str {
        "retriever_tool"
    }

    fn description(&self) -> &str {
        "Retrieve and return relevant information from the vector store based on the query."
    }

    fn schema(&self) -> Value {
        object_schema()
            .property("query", string_prop("What to look up in the document"), true)
            .build()
    }

    async fn call(&self, args: Value) -> Result<String> {
        let params: RetrieverParams = parse_params(args)?;
        let docs = self
            .retriever
            .invoke(&params.query)
            .await
            .map_err(|e| ToolError::Failed(e.to_string()))?;
        Ok(format_chunks(&docs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::{HashEmbedder, VectorStore};
    use serde_json::json;

    #[test]
    fn test_format_chunks() {
        let docs = vec![Document::new("a", "alpha"), Document::new("b", "beta")];
        assert_eq!(format_chunks(&docs), "Chunk 1:\nalpha\n\n\nChunk 2:\nbeta\n");
        assert_eq!(format_chunks(&[]), NO_RESULTS);
    }

    #[tokio::test]
    async fn test_call_uses_retriever() {
        let embedder = Arc::new(HashEmbedder::new(64));
        let mut store = VectorStore::new("slides");
        store
            .add_documents(
                vec![
                    Document::new("1", "options pricing with black scholes"),
                    Document::new("2", "portfolio variance and covariance"),
                ],
                embedder.as_ref(),
            )
            .await
            .unwrap();
        let retriever = Arc::new(Retriever::new(Arc::new(store), embedder, 1));
        let out = RetrieverTool::new(retriever)
            .call(json!({"query": "black scholes pricing"}))
            .await
            .unwrap();
        assert_eq!(out, "Chunk 1:\noptions pricing with black scholes\n");
    }

    #[tokio::test]
    async fn test_empty_store() {
        let embedder = Arc::new(HashEmbedder::new(16));
        let retriever = Arc::new(Retriever::new(Arc::new(VectorStore::new("empty")), embedder, 4));
        let out = RetrieverTool::new(retriever)
            .call(json!({"query": "anything"}))
            .await
            .unwrap();
        assert_eq!(out, NO_RESULTS);
    }
}
