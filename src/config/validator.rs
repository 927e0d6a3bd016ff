use crate::config::{Config, IndexBackend, ProviderSettings, SCHEMA_VERSION};
use crate::error::{FaqragError, Result, ValidationError};
use crate::llm::ProviderKind;
use std::collections::HashSet;
use std::net::SocketAddr;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every problem before failing
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_server(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);
        Self::validate_llm(config, &mut errors);
        Self::validate_fallback(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FaqragError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_server(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.server.bind.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "server.bind",
                format!("Invalid bind address: {}", config.server.bind),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        // Existence is checked when the artifacts are opened
        let paths = [
            ("storage.index_path", &config.storage.index_path),
            ("storage.meta_path", &config.storage.meta_path),
            ("storage.log_path", &config.storage.log_path),
        ];
        for (key, path) in paths {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::new(key, "Path cannot be empty"));
            }
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.model.trim().is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        let retrieval = &config.retrieval;
        if retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }

        if retrieval.context_chars == 0 {
            errors.push(ValidationError::new(
                "retrieval.context_chars",
                "Context character cap must be greater than 0",
            ));
        }

        if retrieval.backend == IndexBackend::Hnsw {
            if retrieval.hnsw_m == 0 {
                errors.push(ValidationError::new(
                    "retrieval.hnsw_m",
                    "HNSW M must be greater than 0",
                ));
            }
            if retrieval.hnsw_ef_construction == 0 {
                errors.push(ValidationError::new(
                    "retrieval.hnsw_ef_construction",
                    "HNSW ef_construction must be greater than 0",
                ));
            }
            if retrieval.hnsw_ef_search < retrieval.top_k {
                errors.push(ValidationError::new(
                    "retrieval.hnsw_ef_search",
                    format!(
                        "HNSW ef_search ({}) must be at least top_k ({})",
                        retrieval.hnsw_ef_search, retrieval.top_k
                    ),
                ));
            }
        }
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        let llm = &config.llm;

        let mut seen = HashSet::new();
        for name in &llm.providers {
            match name.parse::<ProviderKind>() {
                Ok(kind) => {
                    if !seen.insert(kind) {
                        errors.push(ValidationError::new(
                            "llm.providers",
                            format!("Provider '{}' is listed more than once", name),
                        ));
                    }
                }
                Err(message) => errors.push(ValidationError::new("llm.providers", message)),
            }
        }

        if !(0.0..=2.0).contains(&llm.temperature) {
            errors.push(ValidationError::new(
                "llm.temperature",
                format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    llm.temperature
                ),
            ));
        }

        if llm.max_tokens == 0 {
            errors.push(ValidationError::new(
                "llm.max_tokens",
                "max_tokens must be greater than 0",
            ));
        }

        if llm.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "llm.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }

        Self::validate_provider("llm.anthropic", &llm.anthropic, errors);
        Self::validate_provider("llm.openai", &llm.openai, errors);
        Self::validate_provider("llm.gemini", &llm.gemini, errors);
    }

    fn validate_provider(prefix: &str, settings: &ProviderSettings, errors: &mut Vec<ValidationError>) {
        if settings.api_key_env.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("{}.api_key_env", prefix),
                "API key variable name cannot be empty",
            ));
        }
        if settings.model.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("{}.model", prefix),
                "Model name cannot be empty",
            ));
        }
        if !settings.base_url.starts_with("http://") && !settings.base_url.starts_with("https://")
        {
            errors.push(ValidationError::new(
                format!("{}.base_url", prefix),
                format!("Base URL must be http(s), got '{}'", settings.base_url),
            ));
        }
    }

    fn validate_fallback(config: &Config, errors: &mut Vec<ValidationError>) {
        let fallback = &config.fallback;
        if fallback.corpus_path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "fallback.corpus_path",
                "Corpus path cannot be empty",
            ));
        }

        if fallback.max_features == 0 {
            errors.push(ValidationError::new(
                "fallback.max_features",
                "max_features must be greater than 0",
            ));
        }

        if !(0.0..1.0).contains(&fallback.min_similarity) {
            errors.push(ValidationError::new(
                "fallback.min_similarity",
                format!(
                    "min_similarity must be in [0.0, 1.0), got {}",
                    fallback.min_similarity
                ),
            ));
        }

        if fallback.answer_chars == 0 {
            errors.push(ValidationError::new(
                "fallback.answer_chars",
                "answer_chars must be greater than 0",
            ));
        }
    }
}
