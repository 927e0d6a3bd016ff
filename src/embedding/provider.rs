/// Embedding provider trait and FastEmbed implementation
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitializationError(String),

    #[error("Embedding generation failed: {0}")]
    GenerationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Trait for embedding providers
///
/// The retriever only needs single-text embedding at query time; passages are
/// embedded offline by the index builder.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Known models: (config names, fastembed enum, dimension, approx download MB)
fn resolve_model(model_name: &str) -> Option<(EmbeddingModel, usize, usize)> {
    let resolved = match model_name {
        "intfloat/multilingual-e5-small" | "multilingual-e5-small" => {
            (EmbeddingModel::MultilingualE5Small, 384, 470)
        }
        "intfloat/multilingual-e5-base" | "multilingual-e5-base" => {
            (EmbeddingModel::MultilingualE5Base, 768, 1110)
        }
        "intfloat/multilingual-e5-large" | "multilingual-e5-large" => {
            (EmbeddingModel::MultilingualE5Large, 1024, 2240)
        }
        "all-MiniLM-L6-v2" | "all-minilm-l6-v2" => (EmbeddingModel::AllMiniLML6V2, 384, 90),
        "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384, 130),
        "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768, 440),
        _ => return None,
    };
    Some(resolved)
}

/// FastEmbed provider for local embedding generation
///
/// Runs the ONNX model in-process; nothing leaves the machine at query time.
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Create a new FastEmbed provider with the specified model
    ///
    /// **Important**: model files are downloaded on first use. The multilingual
    /// E5 family is large (the base model is around 1GB), so the first start of
    /// a fresh machine is slow.
    pub fn new(model_name: &str, cache_dir: Option<PathBuf>) -> Result<Self, EmbeddingError> {
        let (embedding_model, dimension, model_size_mb) =
            resolve_model(model_name).ok_or_else(|| {
                EmbeddingError::InitializationError(format!(
                    "Unsupported model: {}. Supported: intfloat/multilingual-e5-{{small,base,large}}, \
                     all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5",
                    model_name
                ))
            })?;

        tracing::info!(
            "Initializing embedding model: {} ({}D, ~{}MB download if not cached)",
            model_name,
            dimension,
            model_size_mb
        );

        let mut init_options = InitOptions::new(embedding_model).with_show_download_progress(true);
        if let Some(dir) = cache_dir {
            init_options = init_options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(init_options)
            .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        let mut embeddings = self
            .model
            .embed(vec![text.to_string()], None)
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        let embedding = embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::GenerationError("No embeddings generated".to_string()))?;

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Scale a vector to unit length in place; zero vectors are left untouched
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_resolution() {
        assert!(resolve_model("intfloat/multilingual-e5-base").is_some());
        assert_eq!(resolve_model("multilingual-e5-large").map(|m| m.1), Some(1024));
        assert!(resolve_model("text-embedding-3-small").is_none());
    }

    #[test]
    fn test_unsupported_model_rejected_before_download() {
        let result = FastEmbedProvider::new("not-a-model", None);
        assert!(matches!(
            result,
            Err(EmbeddingError::InitializationError(_))
        ));
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0; 3];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 3]);
    }

    #[test]
    #[ignore] // Requires model download (~1GB) - run with: cargo test -- --ignored
    fn test_query_embedding_is_unit_length() {
        let provider = FastEmbedProvider::new("intfloat/multilingual-e5-base", None).unwrap();
        let embedding = provider.embed("query: giá phần mềm kế toán").unwrap();
        assert_eq!(embedding.len(), 768);

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.1);
    }

    #[test]
    #[ignore] // Requires model download (~1GB) - run with: cargo test -- --ignored
    fn test_query_prefers_matching_passage() {
        let provider = FastEmbedProvider::new("intfloat/multilingual-e5-base", None).unwrap();

        let query = provider.embed("query: chính sách bảo hành").unwrap();
        let warranty = provider
            .embed("passage: Sản phẩm được bảo hành 12 tháng kể từ ngày mua.")
            .unwrap();
        let unrelated = provider
            .embed("passage: Văn phòng mở cửa từ thứ Hai đến thứ Sáu.")
            .unwrap();

        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&query, &warranty) > dot(&query, &unrelated));
    }
}
