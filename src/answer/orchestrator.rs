use crate::config::RetrievalConfig;
use crate::fallback::LexicalFallback;
use crate::llm::{Generation, ProviderChain};
use crate::retrieval::{build_context, RetrievalError, Retriever, SourceRef};
use serde::Serialize;
use std::fmt;

use super::chitchat::detect_chitchat;
use super::prompt::build_prompt;

/// Answer text with the sources shown to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SourceRef>,
}

/// Which path produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOrigin {
    Chitchat,
    Generated { provider: &'static str },
    Lexical,
    Unavailable,
}

impl fmt::Display for AnswerOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerOrigin::Chitchat => f.write_str("chitchat"),
            AnswerOrigin::Generated { provider } => write!(f, "llm:{}", provider),
            AnswerOrigin::Lexical => f.write_str("lexical"),
            AnswerOrigin::Unavailable => f.write_str("unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub answer: Answer,
    pub origin: AnswerOrigin,
}

/// Drives one question through chit-chat, retrieval, generation and fallback
pub struct Orchestrator {
    retriever: Retriever,
    chain: ProviderChain,
    fallback: LexicalFallback,
    top_k: usize,
    context_chars: usize,
}

impl Orchestrator {
    pub fn new(
        retriever: Retriever,
        chain: ProviderChain,
        fallback: LexicalFallback,
        settings: &RetrievalConfig,
    ) -> Self {
        Self {
            retriever,
            chain,
            fallback,
            top_k: settings.top_k,
            context_chars: settings.context_chars,
        }
    }

    /// Answer a question
    ///
    /// Provider and fallback failures degrade the answer but never error; only
    /// retrieval problems are returned as `Err`.
    pub fn answer(&self, question: &str) -> Result<Outcome, RetrievalError> {
        if let Some(kind) = detect_chitchat(question) {
            tracing::debug!("Chit-chat detected: {:?}", kind);
            return Ok(Outcome {
                answer: Answer {
                    text: kind.reply().to_string(),
                    sources: Vec::new(),
                },
                origin: AnswerOrigin::Chitchat,
            });
        }

        let passages = self.retriever.retrieve(question, self.top_k)?;
        let context = build_context(passages.iter().map(|p| &p.passage), self.context_chars);
        let sources: Vec<SourceRef> = passages.iter().map(|p| p.passage.source()).collect();

        let reason = match self.chain.generate(&build_prompt(question, &context)) {
            Generation::Answered { provider, text } => {
                return Ok(Outcome {
                    answer: Answer { text, sources },
                    origin: AnswerOrigin::Generated { provider },
                });
            }
            Generation::Unavailable(reason) => reason,
        };

        tracing::info!("No usable model answer ({:?}); trying lexical fallback", reason);
        if let Some(found) = self.fallback.search(question) {
            return Ok(Outcome {
                answer: Answer {
                    text: found.answer,
                    sources: vec![found.source],
                },
                origin: AnswerOrigin::Lexical,
            });
        }

        tracing::warn!("Lexical fallback found no match");
        Ok(Outcome {
            answer: Answer {
                text: reason.fallback_text().to_string(),
                sources,
            },
            origin: AnswerOrigin::Unavailable,
        })
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn providers(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    pub fn fallback(&self) -> &LexicalFallback {
        &self.fallback
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }
}
