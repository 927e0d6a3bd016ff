use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppContext;

/// HTTP routes: `POST /ask`, `GET /health`, `GET /metrics`
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ask", post(handlers::ask))
        .route("/metrics", get(handlers::metrics))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
}
