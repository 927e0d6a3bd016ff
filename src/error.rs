use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::{EmbeddingError, VectorIndexError};
use crate::fallback::CorpusError;
use crate::llm::ProviderError;
use crate::retrieval::RetrievalError;

/// Main error type for faqrag
#[derive(Error, Debug)]
pub enum FaqragError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Embedding model errors
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Vector index errors
    #[error(transparent)]
    VectorIndex(#[from] VectorIndexError),

    /// Retrieval errors (index/metadata consistency)
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Request rejected before reaching the pipeline
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// LLM provider construction errors
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Lexical fallback corpus errors
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for faqrag operations
pub type Result<T> = std::result::Result<T, FaqragError>;
