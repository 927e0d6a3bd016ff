//! Embedding & vector search
//!
//! - `EmbeddingProvider` trait for abstraction over the query encoder
//! - `FastEmbedProvider` for local multilingual E5 embeddings
//! - `VectorIndex`: flat inner-product index persisted by the index builder,
//!   optionally fronted by an HNSW graph for approximate search
mod provider;
mod vector_index;

pub use provider::{normalize, EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use vector_index::{SearchResult, VectorIndex, VectorIndexError};
