//! Speech Synthesis Service
//!
//! Converts the interpreter's spoken text into audio. Synthesis is entirely
//! decoupled from lead and payment handling: callers treat any failure here
//! as "no audio" and carry on.

use anyhow::{Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Deepgram's text-to-speech endpoint.
pub const DEEPGRAM_SPEAK_URL: &str = "https://api.deepgram.com/v1/speak";

/// Default Deepgram voice model.
pub const DEFAULT_VOICE_MODEL: &str = "aura-orion-en";

/// Defines the contract for any service that can voice a reply.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes `text` and returns the encoded audio (MP3).
    async fn synthesize(&self, text: &str) -> Result<Bytes>;

    /// Whether calling `synthesize` can produce audio at all.
    fn is_enabled(&self) -> bool {
        true
    }
}

#[derive(Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
}

/// A `SpeechSynthesizer` backed by Deepgram's Aura voices.
pub struct DeepgramSynthesizer {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl DeepgramSynthesizer {
    /// Creates a synthesizer for `model`, with a per-request `timeout`.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: DEEPGRAM_SPEAK_URL.to_string(),
            model: model.into(),
        })
    }

    /// Points the synthesizer at a different base endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl SpeechSynthesizer for DeepgramSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Bytes> {
        if text.trim().is_empty() {
            bail!("Refusing to synthesize empty text");
        }

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("model", self.model.as_str())])
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&SpeakRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Deepgram returned {}: {}", status, body);
        }

        let audio = response.bytes().await?;
        info!(model = %self.model, bytes = audio.len(), "Speech synthesized");
        Ok(audio)
    }
}

/// Stands in when no synthesis credentials are configured.
pub struct DisabledSynthesizer;

#[async_trait]
impl SpeechSynthesizer for DisabledSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Bytes> {
        bail!("Speech synthesis is not configured")
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
