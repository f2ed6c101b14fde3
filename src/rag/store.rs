//! In-memory vector store with JSON snapshots

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Document, Embedder, RagError, Result};

const EMBED_BATCH: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredChunk {
    document: Document,
    embedding: Vec<f32>,
}

/// Embedded documents of one collection, searched by cosine similarity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStore {
    collection: String,
    entries: Vec<StoredChunk>,
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

impl VectorStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            entries: Vec::new(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embed and store documents; returns how many were added
    pub async fn add_documents(
        &mut self,
        docs: Vec<Document>,
        embedder: &dyn Embedder,
    ) -> Result<usize> {
        let added = docs.len();
        for batch in docs.chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let embeddings = embedder.embed(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(RagError::EmbeddingCount {
                    expected: batch.len(),
                    got: embeddings.len(),
                });
            }
            self.entries.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(embeddings)
                    .map(|(document, embedding)| StoredChunk { document, embedding }),
            );
            debug!("Embedded {} documents into {}", self.entries.len(), self.collection);
        }
        Ok(added)
    }

    /// Top `k` documents by cosine similarity; ties keep insertion order
    pub fn similarity_search(&self, query: &[f32], k: usize) -> Vec<(Document, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(k)
            .map(|(i, score)| (self.entries[i].document.clone(), score))
            .collect()
    }

    pub fn snapshot_path(dir: &Path, collection: &str) -> PathBuf {
        dir.join(format!("{}.json", collection))
    }

    /// Write `{dir}/{collection}.json`
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = Self::snapshot_path(dir, &self.collection);
        std::fs::create_dir_all(dir).map_err(|e| RagError::Snapshot {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let json = serde_json::to_string(self).map_err(|e| RagError::Snapshot {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| RagError::Snapshot {
            path: path.clone(),
            message: e.to_string(),
        })?;
        info!("Saved {} chunks to {}", self.entries.len(), path.display());
        Ok(path)
    }

    /// Load a snapshot; `None` when it does not exist yet
    pub fn load(dir: &Path, collection: &str) -> Result<Option<Self>> {
        let path = Self::snapshot_path(dir, collection);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| RagError::Snapshot {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let store: Self = serde_json::from_str(&content).map_err(|e| RagError::Snapshot {
            path: path.clone(),
            message: e.to_string(),
        })?;
        info!("Loaded {} chunks from {}", store.entries.len(), path.display());
        Ok(Some(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::HashEmbedder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cosine() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    async fn sample_store() -> VectorStore {
        let embedder = HashEmbedder::new(128);
        let mut store = VectorStore::new("reviews");
        store
            .add_documents(
                vec![
                    Document::new("0", "soggy crust and cold pizza"),
                    Document::new("1", "friendly staff and quick service"),
                    Document::new("2", "the pizza crust was perfectly crispy"),
                ],
                &embedder,
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_similarity_ranking() {
        let store = sample_store().await;
        let query = HashEmbedder::new(128).embed_one("staff service");
        let results = store.similarity_search(&query, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "1");
        assert!(results[0].1 >= results[1].1);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut store = VectorStore::new("ties");
        for id in ["a", "b", "c"] {
            store.entries.push(StoredChunk {
                document: Document::new(id, id),
                embedding: vec![1.0, 0.0],
            });
        }
        let ids: Vec<String> = store
            .similarity_search(&[1.0, 0.0], 3)
            .into_iter()
            .map(|(d, _)| d.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        assert!(VectorStore::load(dir.path(), "reviews").unwrap().is_none());

        let store = sample_store().await;
        let path = store.save(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("reviews.json"));

        let loaded = VectorStore::load(dir.path(), "reviews").unwrap().unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.collection(), "reviews");
    }
}
