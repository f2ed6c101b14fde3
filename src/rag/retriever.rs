use std::sync::Arc;

use tracing::debug;

use super::{Document, Embedder, Result, VectorStore};

/// Query-to-documents lookup over a vector store
pub struct Retriever {
    store: Arc<VectorStore>,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl Retriever {
    pub fn new(store: Arc<VectorStore>, embedder: Arc<dyn Embedder>, k: usize) -> Self {
        Self { store, embedder, k }
    }

    /// The `k` stored documents most similar to `query`
    pub async fn invoke(&self, query: &str) -> Result<Vec<Document>> {
        if self.store.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed_query(query).await?;
        let results = self.store.similarity_search(&query_vec, self.k);
        debug!(
            "Retrieved {} of {} chunks from {}",
            results.len(),
            self.store.len(),
            self.store.collection()
        );
        Ok(results.into_iter().map(|(doc, _)| doc).collect())
    }
}
