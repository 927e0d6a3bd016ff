use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AppContext;
use crate::error::FaqragError;
use crate::retrieval::SourceRef;
use crate::telemetry::MetricsSnapshot;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

pub async fn ask(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let outcome = tokio::task::spawn_blocking(move || ctx.assistant.ask(&request.question))
        .await
        .map_err(|e| internal_error(format!("answer task failed: {}", e)))?
        .map_err(error_response)?;

    Ok(Json(AskResponse {
        answer: outcome.answer.text,
        sources: outcome.answer.sources,
    }))
}

pub async fn metrics(State(ctx): State<Arc<AppContext>>) -> Result<Json<MetricsSnapshot>, ApiError> {
    let snapshot = tokio::task::spawn_blocking(move || ctx.metrics.snapshot())
        .await
        .map_err(|e| internal_error(format!("metrics task failed: {}", e)))?
        .map_err(error_response)?;

    Ok(Json(snapshot))
}

fn error_response(err: FaqragError) -> ApiError {
    match err {
        FaqragError::InvalidRequest(message) => bad_request(message),
        other => {
            tracing::error!("Request failed: {}", other);
            internal_error(other.to_string())
        }
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

fn internal_error(message: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}
