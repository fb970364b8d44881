//! Speech-to-text client.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::info;

use clipo_models::{sort_segments, ContentSegment};

use crate::client::{ApiKeyRing, MlClientConfig};
use crate::error::{MlError, MlResult};
use crate::types::TranscriptionResponse;

/// Turns an audio track into timed text segments.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// `audio` is an mp3 payload; segments come back sorted by start time.
    async fn transcribe(&self, audio: Vec<u8>) -> MlResult<Vec<ContentSegment>>;
}

/// OpenAI-compatible `/audio/transcriptions` client.
pub struct WhisperClient {
    client: Client,
    config: MlClientConfig,
    keys: ApiKeyRing,
}

impl WhisperClient {
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
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
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: Vec<u8>) -> MlResult<Vec<ContentSegment>> {
        let url = format!("{}/audio/transcriptions", self.config.base_url);
        let audio_bytes = audio.len();

        let file = Part::bytes(audio)
            .file_name("audio.mp3")
            .mime_str("audio/mpeg")?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.config.transcription_model.clone())
            .text("response_format", "verbose_json")
            .text("temperature", "0");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.keys.next_key())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::from_status(status, &body));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| MlError::invalid_response(format!("transcription response: {}", e)))?;

        let mut segments: Vec<ContentSegment> = body
            .segments
            .into_iter()
            .map(|s| ContentSegment::new(s.start, s.end, s.text.trim()))
            .collect();
        sort_segments(&mut segments);

        info!(
            audio_bytes,
            segments = segments.len(),
            "Transcription complete"
        );
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WhisperClient {
        WhisperClient::new(MlClientConfig {
            base_url: server.uri(),
            api_keys: vec!["key".into()],
            ..MlClientConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_segments_sorted_and_trimmed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "b a",
                "segments": [
                    { "id": 1, "start": 4.0, "end": 8.5, "text": " second" },
                    { "id": 0, "start": 0.0, "end": 4.0, "text": " first " }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let segments = client_for(&server).transcribe(vec![0u8; 16]).await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "first");
        assert_eq!(segments[1].start, 4.0);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).transcribe(vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, MlError::ServiceUnavailable(_)));
    }
}
