//! Retrieval: documents, chunking, embeddings and a small vector store

mod document;
mod embedding;
mod loaders;
mod retriever;
mod splitter;
mod store;

pub use document::Document;
pub use embedding::{Embedder, HashEmbedder, OllamaEmbedder};
pub use loaders::{load_pages, load_pdf_pages, load_reviews_csv, load_text_pages};
pub use retriever::Retriever;
pub use splitter::TextSplitter;
pub use store::VectorStore;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    InvalidSplitter { size: usize, overlap: usize },

    #[error("failed to read {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid PDF {path}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("embedding request failed: {0}")]
    Embedding(String),

    #[error("embedder returned {got} vectors for {expected} texts")]
    EmbeddingCount { expected: usize, got: usize },

    #[error("vector store snapshot {path}: {message}")]
    Snapshot { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, RagError>;
