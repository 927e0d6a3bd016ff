//! Language-model providers
//!
//! Each provider turns one prompt into one completion over a blocking HTTP
//! call. `ProviderChain` holds the configured providers in priority order and
//! reports the outcome as a [`Generation`] instead of an error.

mod anthropic;
mod chain;
mod gemini;
mod openai;

pub use anthropic::AnthropicProvider;
pub use chain::{
    is_unusable, Generation, ProviderChain, UnavailableReason, UNAVAILABLE_ANSWER, UNUSABLE_MARKERS,
};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use crate::config::{LlmConfig, ProviderSettings};
use reqwest::blocking::Response;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} client setup failed: {message}")]
    Client {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response malformed: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },
}

/// Trait implemented by concrete LLM providers.
pub trait LlmProvider: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &'static str;

    fn generate(&self, request: &ProviderRequest) -> Result<String, ProviderError>;
}

/// Request envelope shared by the various providers.
pub struct ProviderRequest<'a> {
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// Supported provider backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Gemini,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(format!(
                "unsupported llm provider '{}'; use anthropic, openai or gemini",
                other
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anthropic => f.write_str("anthropic"),
            Self::OpenAi => f.write_str("openai"),
            Self::Gemini => f.write_str("gemini"),
        }
    }
}

impl ProviderKind {
    fn settings<'a>(&self, config: &'a LlmConfig) -> &'a ProviderSettings {
        match self {
            Self::Anthropic => &config.anthropic,
            Self::OpenAi => &config.openai,
            Self::Gemini => &config.gemini,
        }
    }
}

/// Instantiate every provider in `config.providers` whose API key is present
///
/// Providers without credentials are skipped. A provider whose client cannot
/// be built (for example a key that is not a valid header value) is a
/// configuration error.
pub fn build_providers(config: &LlmConfig) -> Result<Vec<Box<dyn LlmProvider>>, ProviderError> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    let mut providers: Vec<Box<dyn LlmProvider>> = Vec::new();

    for name in &config.providers {
        let kind = match name.parse::<ProviderKind>() {
            Ok(kind) => kind,
            Err(message) => {
                tracing::warn!("{}", message);
                continue;
            }
        };
        let settings = kind.settings(config);
        let Some(api_key) = settings.api_key() else {
            tracing::debug!(
                "Skipping {} provider: {} is not set",
                kind,
                settings.api_key_env
            );
            continue;
        };

        let provider: Box<dyn LlmProvider> = match kind {
            ProviderKind::Anthropic => Box::new(AnthropicProvider::new(api_key, settings, timeout)?),
            ProviderKind::OpenAi => Box::new(OpenAiProvider::new(api_key, settings, timeout)?),
            ProviderKind::Gemini => Box::new(GeminiProvider::new(api_key, settings, timeout)?),
        };
        tracing::info!("LLM provider enabled: {} ({})", kind, settings.model);
        providers.push(provider);
    }

    Ok(providers)
}

/// Map a non-success response to `ProviderError::Status`
fn check_status(provider: &'static str, resp: Response) -> Result<Response, ProviderError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp
        .text()
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(ProviderError::Status {
        provider,
        status,
        body,
    })
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}
