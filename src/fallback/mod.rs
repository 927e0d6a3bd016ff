//! Lexical fallback
//!
//! When the generative path yields nothing usable, the question is matched
//! against the FAQ corpus with TF-IDF cosine similarity and the best row's
//! body becomes the answer.

mod corpus;
mod tfidf;

pub use corpus::{read_rows, CorpusCache, CorpusError, CorpusSnapshot, FaqRow};
pub use tfidf::{best_match, TermCounts, Tokenizer};

use crate::config::FallbackConfig;
use crate::retrieval::{truncate_chars, SourceRef};

/// A corpus row accepted as the answer
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalMatch {
    pub answer: String,
    pub source: SourceRef,
    pub score: f32,
}

pub struct LexicalFallback {
    corpus: CorpusCache,
    max_features: usize,
    min_similarity: f32,
    answer_chars: usize,
}

impl LexicalFallback {
    pub fn new(config: &FallbackConfig) -> Result<Self, CorpusError> {
        Ok(Self {
            corpus: CorpusCache::new(config.corpus_path.clone(), config.cache_corpus)?,
            max_features: config.max_features,
            min_similarity: config.min_similarity,
            answer_chars: config.answer_chars,
        })
    }

    /// Best corpus match for `question`, or `None`
    ///
    /// Corpus problems are logged and reported as no match.
    pub fn search(&self, question: &str) -> Option<LexicalMatch> {
        match self.try_search(question) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Lexical fallback unavailable: {}", e);
                None
            }
        }
    }

    /// Like [`search`](Self::search) but surfaces corpus errors
    pub fn try_search(&self, question: &str) -> Result<Option<LexicalMatch>, CorpusError> {
        let snapshot = self.corpus.snapshot()?;
        let query = self.corpus.tokenizer().counts(question);

        let Some((row, score)) = best_match(&snapshot.counts, &query, self.max_features) else {
            return Ok(None);
        };
        if score <= self.min_similarity {
            tracing::debug!("Lexical fallback best score {:.4} below threshold", score);
            return Ok(None);
        }

        let row = &snapshot.rows[row];
        let answer = truncate_chars(&row.body, self.answer_chars).trim();
        if answer.is_empty() {
            return Ok(None);
        }

        tracing::debug!("Lexical fallback matched '{}' (score {:.4})", row.title, score);
        Ok(Some(LexicalMatch {
            answer: answer.to_string(),
            source: SourceRef {
                url: row.url.clone(),
                title: row.title.clone(),
            },
            score,
        }))
    }

    /// Forget the cached corpus
    pub fn invalidate(&self) {
        self.corpus.invalidate();
    }
}
