//! Passage metadata and source attribution

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::RetrievalError;

/// A bounded chunk of a source document, aligned 1:1 with an index row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub text: String,
}

impl Passage {
    /// Source attribution for this passage
    pub fn source(&self) -> SourceRef {
        SourceRef {
            url: self.url.clone(),
            title: self.title.clone(),
        }
    }
}

/// Source attribution returned to callers and written to the request log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub url: String,
    pub title: String,
}

/// A retrieved passage with its inner-product score
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// Contents of the metadata file written next to the vector index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// `meta[i]` describes row `i` of the vector index
    pub meta: Vec<Passage>,
    /// Embedding model that produced the index vectors
    #[serde(default)]
    pub model: String,
}

impl PassageMetadata {
    /// Read and parse the metadata JSON file
    pub fn load(path: &Path) -> Result<Self, RetrievalError> {
        let content = std::fs::read_to_string(path).map_err(|e| RetrievalError::Metadata {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| RetrievalError::Metadata {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Write the metadata JSON file
    pub fn save(&self, path: &Path) -> Result<(), RetrievalError> {
        let content = serde_json::to_string(self).map_err(|e| RetrievalError::Metadata {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| RetrievalError::Metadata {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
