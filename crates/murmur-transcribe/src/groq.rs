//! Groq Whisper API transcription backend.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::{Result, TranscribeError, Transcriber};

const TRANSCRIPTION_ENDPOINT: &str = "https://api.groq.com/openai/v1/audio/transcriptions";
const DEFAULT_MODEL: &str = "whisper-large-v3-turbo";
const RESPONSE_FORMAT: &str = "verbose_json";

/// Configuration for the Groq transcription client.
#[derive(Debug, Clone, Default)]
pub struct GroqConfig {
    /// Groq API key. Requests fail with [`TranscribeError::NoApiKey`] while
    /// this is unset.
    pub api_key: Option<String>,

    /// Model to use (defaults to whisper-large-v3-turbo)
    pub model: Option<String>,
}

impl GroqConfig {
    /// Create a new Groq config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            model: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Get the model name, using default if not set.
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Groq Whisper API client.
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    config: GroqConfig,
}

/// The endpoint is asked for `verbose_json`; only the transcript text is
/// extracted from the detailed payload.
#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
}

impl GroqClient {
    /// Create a new Groq client with the given configuration.
    pub fn new(config: GroqConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a client from just an API key with default settings.
    pub fn from_api_key(api_key: impl Into<String>) -> Self {
        Self::new(GroqConfig::new(api_key))
    }
}

#[async_trait]
impl Transcriber for GroqClient {
    async fn transcribe(&self, audio: &[u8], language: Option<&str>) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(TranscribeError::NoApiKey)?;

        debug!(
            model = self.config.model(),
            audio_bytes = audio.len(),
            language = ?language,
            "Sending transcription request to Groq"
        );

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("recording.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| TranscribeError::ApiError(e.to_string()))?,
            )
            .part(
                "model",
                reqwest::multipart::Part::text(self.config.model().to_string()),
            )
            .part(
                "response_format",
                reqwest::multipart::Part::text(RESPONSE_FORMAT),
            );

        if let Some(lang) = language {
            form = form.part("language", reqwest::multipart::Part::text(lang.to_string()));
        }

        let response = self
            .client
            .post(TRANSCRIPTION_ENDPOINT)
            .header("Authorization", format!("Bearer {}", api_key))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::ApiError(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let whisper_response: WhisperResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::TranscriptionFailed(e.to_string()))?;

        Ok(whisper_response.text)
    }

    fn name(&self) -> &str {
        "groq"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_fails_before_any_network_io() {
        let client = GroqClient::new(GroqConfig::default());
        let result = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(client.transcribe(b"not-really-audio", None));
        assert!(matches!(result, Err(TranscribeError::NoApiKey)));
    }

    #[test]
    fn model_defaults_to_turbo_whisper() {
        assert_eq!(GroqConfig::default().model(), "whisper-large-v3-turbo");
        assert_eq!(
            GroqConfig::new("key").with_model("whisper-large-v3").model(),
            "whisper-large-v3"
        );
    }
}
