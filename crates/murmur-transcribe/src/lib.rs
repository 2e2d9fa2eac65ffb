//! Transcription backend library for murmur.
//!
//! This crate provides a trait-based abstraction for audio transcription,
//! with an implementation for Groq's OpenAI-compatible Whisper API.

mod groq;

use async_trait::async_trait;
pub use groq::{GroqClient, GroqConfig};
use thiserror::Error;

/// Errors that can occur during transcription.
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("No API key configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),
}

/// Result type for transcription operations.
pub type Result<T> = std::result::Result<T, TranscribeError>;

/// Trait for transcription backends.
///
/// Implement this trait to add new transcription backends (e.g., other
/// cloud providers).
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio to text.
    ///
    /// # Arguments
    /// * `audio` - Encoded audio data (WAV) to send.
    /// * `language` - Optional language hint (ISO 639-1 code, e.g., "en")
    async fn transcribe(&self, audio: &[u8], language: Option<&str>) -> Result<String>;

    /// Returns the name of this transcriber for logging/debugging.
    fn name(&self) -> &str;
}
