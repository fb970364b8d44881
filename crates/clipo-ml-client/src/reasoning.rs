//! Chat-completion reasoning client.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::client::{ApiKeyRing, MlClientConfig};
use crate::error::{MlError, MlResult};
use crate::types::{ChatMessage, ChatRequest, ChatResponse};

const SYSTEM_PROMPT: &str =
    "You are a viral video editor. Respond with a JSON array only, no commentary.";

/// Anything that can turn a prompt into free-form model text.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> MlResult<String>;
}

/// OpenAI-compatible `/chat/completions` client with model fallback and key rotation.
pub struct ChatCompletionClient {
    client: Client,
    config: MlClientConfig,
    keys: ApiKeyRing,
}

impl ChatCompletionClient {
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        if config.chat_models.is_empty() {
            return Err(MlError::config("no chat model configured"));
        }
        let keys = ApiKeyRing::new(config.api_keys.clone())?;
        let client = config.http_client()?;
        Ok(Self {
            client,
            config,
            keys,
        })
    }

    pub fn from_env() -> MlResult<Self> {
        Self::new(MlClientConfig::from_env())
    }

    async fn call_model(&self, model: &str, prompt: &str) -> MlResult<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_completion_tokens: self.config.max_completion_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.keys.next_key())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::from_status(status, &body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| MlError::invalid_response(format!("chat response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| MlError::invalid_response("no content in chat response"))
    }
}

#[async_trait]
impl ReasoningClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> MlResult<String> {
        let mut last_error = None;

        for model in &self.config.chat_models {
            debug!(model = %model, prompt_chars = prompt.len(), "Requesting completion");
            match self.call_model(model, prompt).await {
                Ok(text) => {
                    info!(model = %model, response_chars = text.len(), "Completion received");
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| MlError::request_failed("all chat models failed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, models: &[&str]) -> MlClientConfig {
        MlClientConfig {
            base_url: server.uri(),
            api_keys: vec!["key-a".into(), "key-b".into()],
            chat_models: models.iter().map(|m| m.to_string()).collect(),
            ..MlClientConfig::default()
        }
    }

    fn completion(text: &str) -> serde_json::Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
    }

    #[tokio::test]
    async fn test_complete_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer key-a"))
            .and(body_partial_json(json!({ "model": "m1", "max_completion_tokens": 8192 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("[]")))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(config_for(&server, &["m1"])).unwrap();
        assert_eq!(client.complete("hello").await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_falls_back_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": "broken" })))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": "backup" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("[{}]")))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(config_for(&server, &["broken", "backup"])).unwrap();
        assert_eq!(client.complete("p").await.unwrap(), "[{}]");
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_when_all_models_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(config_for(&server, &["m1"])).unwrap();
        let err = client.complete("p").await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_empty_content_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = ChatCompletionClient::new(config_for(&server, &["m1"])).unwrap();
        assert!(matches!(
            client.complete("p").await,
            Err(MlError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_requires_api_key() {
        let config = MlClientConfig::default();
        assert!(matches!(
            ChatCompletionClient::new(config),
            Err(MlError::Config(_))
        ));
    }
}
