//! faqrag - grounded FAQ answering
//!
//! Retrieves passages from a pre-built vector index, asks the first available
//! language model to answer from them, and falls back to TF-IDF matching over
//! the FAQ corpus when no usable model answer comes back. Every request is
//! appended to a JSONL log that the metrics endpoint summarizes.

pub mod answer;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod fallback;
pub mod llm;
pub mod retrieval;
pub mod server;
pub mod telemetry;

pub use error::{FaqragError, Result};
