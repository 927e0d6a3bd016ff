//! Configuration management for faqrag
//!
//! Settings come from a TOML file (or built-in defaults), then environment
//! variables are layered on top: the conventional `EMBED_MODEL`, `TOP_K` and
//! `CLAUDE_MODEL` variables, plus `FAQRAG_SECTION__KEY=value` overrides.
//! Provider credentials are never stored in the file; each provider names the
//! environment variable that holds its key.

use crate::error::{FaqragError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

mod validator;

pub use validator::ConfigValidator;

/// Schema version written by `faqrag config init`
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    pub fallback: FallbackConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind (host:port)
    pub bind: String,
}

/// Artifact locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Binary vector index produced by the index builder
    pub index_path: PathBuf,
    /// Passage metadata aligned with the index rows
    pub meta_path: PathBuf,
    /// Append-only request log (JSON lines)
    pub log_path: PathBuf,
}

/// Query embedding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Must match the model recorded in the metadata file
    pub model: String,
    /// Where downloaded model files are cached (fastembed default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

/// Nearest-neighbour search backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Exact inner-product scan over all rows
    Flat,
    /// Approximate HNSW graph built at startup
    Hnsw,
}

impl FromStr for IndexBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "hnsw" => Ok(Self::Hnsw),
            other => Err(format!("unknown index backend '{}'", other)),
        }
    }
}

impl fmt::Display for IndexBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => f.write_str("flat"),
            Self::Hnsw => f.write_str("hnsw"),
        }
    }
}

/// Retrieval and context assembly settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Per-passage character cap inside the prompt context
    pub context_chars: usize,
    pub backend: IndexBackend,
    pub hnsw_m: usize,
    pub hnsw_ef_construction: usize,
    pub hnsw_ef_search: usize,
}

/// Connection settings for one language-model provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub model: String,
    pub base_url: String,
}

impl ProviderSettings {
    /// Reads the API key from the environment, treating blank values as absent
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Language-model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider priority order; the first configured provider is tried first
    pub providers: Vec<String>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
    pub anthropic: ProviderSettings,
    pub openai: ProviderSettings,
    pub gemini: ProviderSettings,
}

/// Lexical (TF-IDF) fallback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// CSV with url,title,body columns
    pub corpus_path: PathBuf,
    pub max_features: usize,
    /// Best-row similarity must be strictly above this value
    pub min_similarity: f32,
    pub answer_chars: usize,
    /// Keep parsed rows between calls, reloading when the file changes
    pub cache_corpus: bool,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FaqragError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| FaqragError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Built-in defaults with environment overrides applied and validated
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| FaqragError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            let result = match key.as_str() {
                "EMBED_MODEL" => self.set_value_from_env("EMBEDDING__MODEL", &value),
                "TOP_K" => self.set_value_from_env("RETRIEVAL__TOP_K", &value),
                "CLAUDE_MODEL" => self.set_value_from_env("LLM__ANTHROPIC__MODEL", &value),
                _ => match key.strip_prefix("FAQRAG_") {
                    Some(config_key) => self.set_value_from_env(config_key, &value),
                    None => continue,
                },
            };
            if let Err(e) = result {
                tracing::warn!("Failed to apply env override {}: {}", key, e);
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "SERVER__BIND" => self.server.bind = value.to_string(),
            "EMBEDDING__MODEL" => self.embedding.model = value.to_string(),
            "RETRIEVAL__TOP_K" => self.retrieval.top_k = parse_value(path, value)?,
            "RETRIEVAL__BACKEND" => {
                self.retrieval.backend =
                    value
                        .parse()
                        .map_err(|message| FaqragError::InvalidConfigValue {
                            path: path.to_string(),
                            message,
                        })?;
            }
            "LLM__TEMPERATURE" => self.llm.temperature = parse_value(path, value)?,
            "LLM__ANTHROPIC__MODEL" => self.llm.anthropic.model = value.to_string(),
            "LLM__OPENAI__MODEL" => self.llm.openai.model = value.to_string(),
            "LLM__GEMINI__MODEL" => self.llm.gemini.model = value.to_string(),
            "FALLBACK__CORPUS_PATH" => self.fallback.corpus_path = PathBuf::from(value),
            "STORAGE__LOG_PATH" => self.storage.log_path = PathBuf::from(value),
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FaqragError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("faqrag").join("config.toml"))
    }
}

fn parse_value<T: FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FaqragError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}'", value),
        })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            server: ServerConfig {
                bind: "127.0.0.1:8000".to_string(),
            },
            storage: StorageConfig {
                index_path: PathBuf::from("storage/index.bin"),
                meta_path: PathBuf::from("storage/meta.json"),
                log_path: PathBuf::from("storage/log.jsonl"),
            },
            embedding: EmbeddingConfig {
                model: "intfloat/multilingual-e5-base".to_string(),
                cache_dir: None,
            },
            retrieval: RetrievalConfig {
                top_k: 4,
                context_chars: 800,
                backend: IndexBackend::Flat,
                hnsw_m: 16,
                hnsw_ef_construction: 200,
                hnsw_ef_search: 64,
            },
            llm: LlmConfig {
                providers: vec![
                    "anthropic".to_string(),
                    "openai".to_string(),
                    "gemini".to_string(),
                ],
                temperature: 0.2,
                max_tokens: 300,
                timeout_secs: 60,
                anthropic: ProviderSettings {
                    api_key_env: "ANTHROPIC_API_KEY".to_string(),
                    model: "claude-3-5-sonnet-latest".to_string(),
                    base_url: "https://api.anthropic.com/v1".to_string(),
                },
                openai: ProviderSettings {
                    api_key_env: "OPENAI_API_KEY".to_string(),
                    model: "gpt-4o-mini".to_string(),
                    base_url: "https://api.openai.com/v1".to_string(),
                },
                gemini: ProviderSettings {
                    api_key_env: "GOOGLE_API_KEY".to_string(),
                    model: "gemini-2.5-flash".to_string(),
                    base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                },
            },
            fallback: FallbackConfig {
                corpus_path: PathBuf::from("data/faq.csv"),
                max_features: 500,
                min_similarity: 0.01,
                answer_chars: 240,
                cache_corpus: true,
            },
        }
    }
}
