//! Provider selection by priority

use super::{build_providers, LlmProvider, ProviderError, ProviderRequest};
use crate::config::LlmConfig;

/// Answer returned when no usable model output exists
pub const UNAVAILABLE_ANSWER: &str = "Chưa có trong tài liệu hoặc LLM không khả dụng.";

/// Substrings that mark a model answer as unusable
pub const UNUSABLE_MARKERS: [&str; 2] = ["Chưa có trong tài liệu", "không khả dụng"];

/// Outcome of running a prompt through the provider chain
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    Answered {
        provider: &'static str,
        text: String,
    },
    Unavailable(UnavailableReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnavailableReason {
    /// No provider has credentials configured
    NoProviders,
    /// The provider call errored
    Failed {
        provider: &'static str,
        error: String,
    },
    /// The provider answered with blank text
    Empty { provider: &'static str },
    /// The model replied but its text carries an unusable marker
    Declined {
        provider: &'static str,
        text: String,
    },
}

impl UnavailableReason {
    /// Text to answer with when the lexical fallback finds nothing
    pub fn fallback_text(&self) -> &str {
        match self {
            Self::Declined { text, .. } => text,
            _ => UNAVAILABLE_ANSWER,
        }
    }
}

/// Whether an answer text carries one of the unusable markers
pub fn is_unusable(text: &str) -> bool {
    UNUSABLE_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Providers in priority order with shared sampling settings
pub struct ProviderChain {
    providers: Vec<Box<dyn LlmProvider>>,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn LlmProvider>>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            providers,
            temperature,
            max_tokens,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ProviderError> {
        let providers = build_providers(config)?;
        if providers.is_empty() {
            tracing::warn!("No LLM provider has an API key; answers will come from the lexical fallback");
        }
        Ok(Self::new(providers, config.temperature, config.max_tokens))
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Names of the enabled providers in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Send the prompt to the first configured provider
    ///
    /// The list only fixes priority: the first provider with credentials
    /// answers, and a failed or blank call goes straight to `Unavailable`
    /// without trying the rest. A marker answer is `Declined`.
    pub fn generate(&self, prompt: &str) -> Generation {
        let Some(provider) = self.providers.first() else {
            return Generation::Unavailable(UnavailableReason::NoProviders);
        };
        let name = provider.name();
        let request = ProviderRequest {
            prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let text = match provider.generate(&request) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("LLM provider failed: {}", err);
                return Generation::Unavailable(UnavailableReason::Failed {
                    provider: name,
                    error: err.to_string(),
                });
            }
        };

        let text = text.trim();
        if text.is_empty() {
            tracing::warn!("{} returned an empty answer", name);
            return Generation::Unavailable(UnavailableReason::Empty { provider: name });
        }
        if is_unusable(text) {
            tracing::info!("{} declined to answer from the given context", name);
            return Generation::Unavailable(UnavailableReason::Declined {
                provider: name,
                text: text.to_string(),
            });
        }

        tracing::debug!("Answer generated by {}", name);
        Generation::Answered {
            provider: name,
            text: text.to_string(),
        }
    }
}
