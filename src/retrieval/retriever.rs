//! Dense passage retrieval over the aligned index + metadata pair

use crate::embedding::{normalize, EmbeddingProvider, VectorIndex};
use crate::retrieval::{PassageMetadata, RetrievalError, ScoredPassage};
use std::sync::Arc;

/// Instruction prefix for queries; passages were embedded with `passage: `
pub const QUERY_PREFIX: &str = "query: ";

/// Embeds questions and resolves nearest index rows into passages
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: VectorIndex,
    metadata: PassageMetadata,
}

impl Retriever {
    /// Pair an index with its metadata, refusing misaligned artifacts
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: VectorIndex,
        metadata: PassageMetadata,
    ) -> Result<Self, RetrievalError> {
        if index.len() != metadata.meta.len() {
            return Err(RetrievalError::Misaligned {
                index_rows: index.len(),
                passages: metadata.meta.len(),
            });
        }

        if !index.is_empty() && index.dimension() != embedder.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                index: index.dimension(),
                embedder: embedder.dimension(),
            });
        }

        if !metadata.model.is_empty() && metadata.model != embedder.model_name() {
            tracing::warn!(
                "Index was built with '{}' but queries are embedded with '{}'; similarity scores will be unreliable",
                metadata.model,
                embedder.model_name()
            );
        }

        Ok(Self {
            embedder,
            index,
            metadata,
        })
    }

    /// Retrieve the `top_k` most similar passages, best first
    ///
    /// No similarity floor is applied here: a non-empty index always yields
    /// `min(top_k, len)` passages.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredPassage>, RetrievalError> {
        let mut embedding = self.embedder.embed(&format!("{}{}", QUERY_PREFIX, query))?;
        normalize(&mut embedding);

        let hits = self.index.search(&embedding, top_k)?;

        let mut passages = Vec::with_capacity(hits.len());
        for hit in hits {
            let passage = self.metadata.meta.get(hit.row).ok_or(RetrievalError::RowOutOfRange {
                row: hit.row,
                len: self.metadata.meta.len(),
            })?;
            passages.push(ScoredPassage {
                passage: passage.clone(),
                score: hit.score,
            });
        }

        tracing::debug!(
            "Retrieved {} passages (best score {:.4})",
            passages.len(),
            passages.first().map(|p| p.score).unwrap_or(0.0)
        );

        Ok(passages)
    }

    /// Number of indexed passages
    pub fn len(&self) -> usize {
        self.metadata.meta.len()
    }

    /// Whether the index holds no passages
    pub fn is_empty(&self) -> bool {
        self.metadata.meta.is_empty()
    }

    /// Embedding model used for queries
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingError;
    use crate::retrieval::Passage;
    use std::sync::Mutex;

    /// Records every text it is asked to embed
    struct RecordingEmbedder {
        seen: Mutex<Vec<String>>,
    }

    impl EmbeddingProvider for RecordingEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn passage(slug: &str) -> Passage {
        Passage {
            url: format!("https://mitek.vn/{}", slug),
            title: slug.to_string(),
            text: String::new(),
        }
    }

    fn setup(index: VectorIndex, rows: usize) -> (Retriever, Arc<RecordingEmbedder>) {
        let embedder = Arc::new(RecordingEmbedder {
            seen: Mutex::new(Vec::new()),
        });
        let metadata = PassageMetadata {
            meta: (0..rows).map(|i| passage(&format!("p{}", i))).collect(),
            model: "recording".into(),
        };
        let retriever = Retriever::new(embedder.clone(), index, metadata).unwrap();
        (retriever, embedder)
    }

    #[test]
    fn test_query_prefix_reaches_embedder() {
        let index = VectorIndex::from_rows(2, &[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let (retriever, embedder) = setup(index, 2);

        let question = "Bảng giá phần mềm kế toán?";
        retriever.retrieve(question, 1).unwrap();

        let seen = embedder.seen.lock().unwrap();
        assert_eq!(*seen, vec![format!("query: {}", question)]);
    }

    #[test]
    fn test_graph_row_past_metadata_is_an_error() {
        let rows = vec![vec![0.0, 1.0], vec![0.6, 0.8]];
        let index = VectorIndex::from_rows(2, &rows)
            .unwrap()
            .with_hnsw(16, 200, 32)
            .unwrap();
        index.insert_graph_point(&[1.0, 0.0], 7);
        let (retriever, _) = setup(index, 2);

        let result = retriever.retrieve("giá", 1);
        assert!(matches!(
            result,
            Err(RetrievalError::RowOutOfRange { row: 7, len: 2 })
        ));
    }
}
