//! HTTP API
//!
//! The blocking answer pipeline runs on tokio's blocking pool; handlers only
//! validate input and shape responses.

mod handlers;
mod router;

pub use handlers::{AskRequest, AskResponse, ErrorBody, HealthResponse};
pub use router::router;

use crate::answer::{Assistant, Orchestrator};
use crate::config::{Config, IndexBackend};
use crate::embedding::{EmbeddingProvider, FastEmbedProvider, VectorIndex};
use crate::error::{FaqragError, Result};
use crate::fallback::LexicalFallback;
use crate::llm::ProviderChain;
use crate::retrieval::{PassageMetadata, Retriever};
use crate::telemetry::{MetricsAggregator, RequestLog};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Everything a request needs, built once at startup
pub struct AppContext {
    pub assistant: Assistant,
    pub metrics: MetricsAggregator,
}

impl AppContext {
    pub fn new(assistant: Assistant, metrics: MetricsAggregator) -> Self {
        Self { assistant, metrics }
    }

    /// Load the embedding model, index, metadata and providers
    ///
    /// Must be called outside the async runtime: provider clients are blocking.
    pub fn from_config(config: &Config) -> Result<Self> {
        tracing::info!("Loading embedding model {}", config.embedding.model);
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(FastEmbedProvider::new(
            &config.embedding.model,
            config.embedding.cache_dir.clone(),
        )?);

        let mut index = VectorIndex::load(&config.storage.index_path)?;
        if config.retrieval.backend == IndexBackend::Hnsw {
            index = index.with_hnsw(
                config.retrieval.hnsw_m,
                config.retrieval.hnsw_ef_construction,
                config.retrieval.hnsw_ef_search,
            )?;
        }
        let metadata = PassageMetadata::load(&config.storage.meta_path)?;
        let retriever = Retriever::new(embedder, index, metadata)?;
        tracing::info!(
            "Loaded {} passages from {}",
            retriever.len(),
            config.storage.index_path.display()
        );

        let chain = ProviderChain::from_config(&config.llm)?;
        let fallback = LexicalFallback::new(&config.fallback)?;
        let orchestrator = Orchestrator::new(retriever, chain, fallback, &config.retrieval);

        let assistant = Assistant::new(
            orchestrator,
            RequestLog::new(config.storage.log_path.clone()),
        );
        let metrics = MetricsAggregator::new(config.storage.log_path.clone());

        Ok(Self::new(assistant, metrics))
    }
}

/// Bind `bind` and serve until Ctrl-C
pub async fn serve(ctx: Arc<AppContext>, bind: &str) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| FaqragError::Config(format!("Invalid bind address {}: {}", bind, e)))?;
    let listener = TcpListener::bind(addr).await.map_err(|e| FaqragError::Io {
        source: e,
        context: format!("Failed to bind {}", addr),
    })?;

    serve_on(listener, ctx, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve_on<F>(listener: TcpListener, ctx: Arc<AppContext>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("faqrag listening on http://{}", addr);
    }

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| FaqragError::Io {
            source: e,
            context: "HTTP server failed".to_string(),
        })?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
