use serde::Deserialize;
use std::env;

use crate::error::{Error, Result};

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Top-level SDK configuration accepted by `RecommendationClient::new`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Credential for the reasoning/embedding service. Required; an empty
    /// key fails construction.
    pub api_key: String,
    /// When true, emits a one-line startup log. No other behavioral effect.
    pub debug: bool,
    pub llm: LlmConfig,
    pub embeddings: EmbeddingsConfig,
    pub reasoning: ReasoningConfig,
    pub retrieval: RetrievalConfig,
}

/// LLM configuration for the intent-analysis completion model
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub dimensions: usize,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Domain framing injected into every reasoning prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct ReasoningConfig {
    /// Application domain label, e.g. "Travel & Lifestyle".
    pub domain: String,
    /// Instruction text describing which constraint categories to infer.
    pub constraints_label: String,
    /// Appended verbatim for domain-specific cross-mapping rules.
    pub custom_instructions: Option<String>,
    /// How many of the most recent signals are serialized into a
    /// contextual prompt.
    pub history_window: usize,
}

/// Vector-retrieval tuning. The facade applies `limit`; `threshold` is the
/// similarity cutoff the reference adapter is constructed with
/// (`LibSqlMemoryAdapter::new`/`with_config`). Custom adapters decide their
/// own cutoff policy.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    pub limit: u32,
    pub threshold: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: env::var("LODESTAR_LLM_MODEL")
                .unwrap_or_else(|_| "openai/gpt-4o-mini".to_string()),
            base_url: env::var("LODESTAR_LLM_BASE_URL").ok(),
            timeout_secs: parse_env_or("LODESTAR_LLM_TIMEOUT", 30),
            max_retries: parse_env_or("LODESTAR_LLM_MAX_RETRIES", 3),
        }
    }
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            model: env::var("LODESTAR_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "openai/text-embedding-3-small".to_string()),
            dimensions: parse_env_or("LODESTAR_EMBEDDING_DIMENSIONS", 768),
            base_url: env::var("LODESTAR_EMBEDDING_BASE_URL").ok(),
            timeout_secs: parse_env_or("LODESTAR_EMBEDDING_TIMEOUT", 30),
            max_retries: parse_env_or("LODESTAR_EMBEDDING_MAX_RETRIES", 3),
        }
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            domain: env::var("LODESTAR_DOMAIN")
                .unwrap_or_else(|_| "Travel & Lifestyle".to_string()),
            constraints_label: env::var("LODESTAR_CONSTRAINTS_LABEL").unwrap_or_else(|_| {
                "budget, party size, pace, season, or accessibility".to_string()
            }),
            custom_instructions: env::var("LODESTAR_CUSTOM_INSTRUCTIONS").ok(),
            history_window: parse_env_or("LODESTAR_HISTORY_WINDOW", 10),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: parse_env_or("LODESTAR_SEARCH_LIMIT", 5),
            threshold: parse_env_or("LODESTAR_SEARCH_THRESHOLD", 0.5),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("LODESTAR_DATABASE_URL").unwrap_or_else(|_| "file:lodestar.db".to_string()),
            auth_token: env::var("LODESTAR_DATABASE_AUTH_TOKEN").ok(),
            local_path: env::var("LODESTAR_DATABASE_LOCAL_PATH").ok(),
        }
    }
}

impl ClientConfig {
    /// Build a config from the environment. The api key is read from
    /// `LODESTAR_API_KEY` and validated at client construction, not here.
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("LODESTAR_API_KEY").unwrap_or_default(),
            debug: parse_env_or("LODESTAR_DEBUG", false),
            llm: LlmConfig::default(),
            embeddings: EmbeddingsConfig::default(),
            reasoning: ReasoningConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            debug: false,
            llm: LlmConfig::default(),
            embeddings: EmbeddingsConfig::default(),
            reasoning: ReasoningConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config(
                "api_key is required: pass a credential for the reasoning/embedding service"
                    .to_string(),
            ));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config(
                "embeddings.dimensions must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Known providers that use OpenAI-compatible APIs
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse a model name into a (provider, model) tuple.
/// `openai/gpt-4o-mini` -> `("openai", "gpt-4o-mini")`; an unprefixed name
/// is treated as a model on the default provider.
pub fn parse_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("openai", model)
}
