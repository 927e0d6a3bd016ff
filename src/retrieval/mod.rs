//! Passage retrieval
//!
//! Embeds the question, searches the vector index, resolves hits into
//! passages through the aligned metadata, and formats them into the prompt
//! context block.

mod context;
mod passage;
mod retriever;

pub use context::{build_context, truncate_chars, DEFAULT_CONTEXT_CHARS};
pub use passage::{Passage, PassageMetadata, ScoredPassage, SourceRef};
pub use retriever::{Retriever, QUERY_PREFIX};

use crate::embedding::{EmbeddingError, VectorIndexError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector search failed: {0}")]
    Index(#[from] VectorIndexError),

    #[error("Index has {index_rows} rows but metadata lists {passages} passages")]
    Misaligned { index_rows: usize, passages: usize },

    #[error("Index dimension {index} does not match embedding dimension {embedder}")]
    DimensionMismatch { index: usize, embedder: usize },

    #[error("Index returned row {row} but metadata has only {len} passages")]
    RowOutOfRange { row: usize, len: usize },

    #[error("Failed to read passage metadata {path}: {message}")]
    Metadata { path: String, message: String },
}
