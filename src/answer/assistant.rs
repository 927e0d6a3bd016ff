use crate::error::{FaqragError, Result};
use crate::telemetry::{LogRecord, RequestLog};
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;

use super::{AnswerOrigin, Orchestrator, Outcome};

/// Entry point shared by the HTTP handler and the CLI
///
/// Wraps the orchestrator with request validation, timing and the request log.
pub struct Assistant {
    orchestrator: Orchestrator,
    log: RequestLog,
}

impl Assistant {
    pub fn new(orchestrator: Orchestrator, log: RequestLog) -> Self {
        Self { orchestrator, log }
    }

    #[instrument(skip(self, question), fields(request_id = %Uuid::new_v4()))]
    pub fn ask(&self, question: &str) -> Result<Outcome> {
        if question.trim().is_empty() {
            return Err(FaqragError::InvalidRequest(
                "question must not be empty".to_string(),
            ));
        }

        let started = Instant::now();
        let outcome = self.orchestrator.answer(question)?;
        let elapsed = started.elapsed();

        let record = LogRecord::new(
            question,
            outcome.answer.sources.clone(),
            elapsed,
            outcome.origin == AnswerOrigin::Chitchat,
        );
        if let Err(e) = self.log.append(&record) {
            tracing::warn!("Failed to write request log: {}", e);
        }

        tracing::info!(
            "Answered via {} in {:.3}s with {} sources",
            outcome.origin,
            elapsed.as_secs_f64(),
            outcome.answer.sources.len()
        );
        Ok(outcome)
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn log(&self) -> &RequestLog {
        &self.log
    }
}
