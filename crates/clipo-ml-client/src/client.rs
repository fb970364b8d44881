//! Shared HTTP client configuration.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::error::{MlError, MlResult};

/// Configuration for the reasoning and transcription clients.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    /// Base URL of the OpenAI-compatible API (no trailing slash)
    pub base_url: String,
    /// API keys, rotated per request
    pub api_keys: Vec<String>,
    /// Chat models, tried in order
    pub chat_models: Vec<String>,
    /// Speech-to-text model
    pub transcription_model: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_keys: Vec::new(),
            chat_models: vec!["meta-llama/llama-4-scout-17b-16e-instruct".to_string()],
            transcription_model: "whisper-large-v3".to_string(),
            temperature: 0.7,
            max_completion_tokens: 8192,
            timeout: Duration::from_secs(300),
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    ///
    /// `LLM_API_KEYS` takes a comma-separated list; `LLM_API_KEY` a single key.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_keys = std::env::var("LLM_API_KEYS")
            .or_else(|_| std::env::var("LLM_API_KEY"))
            .map(|s| split_list(&s))
            .unwrap_or_default();

        let chat_models = std::env::var("LLM_MODELS")
            .or_else(|_| std::env::var("LLM_MODEL"))
            .map(|s| split_list(&s))
            .ok()
            .filter(|models| !models.is_empty())
            .unwrap_or(defaults.chat_models);

        Self {
            base_url: std::env::var("LLM_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_keys,
            chat_models,
            transcription_model: std::env::var("TRANSCRIBE_MODEL")
                .unwrap_or(defaults.transcription_model),
            temperature: std::env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.temperature),
            max_completion_tokens: std::env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_completion_tokens),
            timeout: Duration::from_secs(
                std::env::var("ML_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }

    pub(crate) fn http_client(&self) -> MlResult<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(MlError::Network)
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

/// Round-robin over API keys so consecutive requests spread across quotas.
#[derive(Debug, Clone)]
pub struct ApiKeyRing {
    keys: Arc<Vec<String>>,
    next: Arc<AtomicUsize>,
}

impl ApiKeyRing {
    pub fn new(keys: Vec<String>) -> MlResult<Self> {
        if keys.is_empty() {
            return Err(MlError::config("no API key configured (set LLM_API_KEYS)"));
        }
        Ok(Self {
            keys: Arc::new(keys),
            next: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Next key in rotation.
    pub fn next_key(&self) -> &str {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        &self.keys[idx]
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
