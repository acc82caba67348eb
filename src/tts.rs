//! Text-to-speech (TTS) processing

use async_trait::async_trait;

use crate::{Error, Result};

/// Synthesized speech: mono 16-bit PCM at a known rate
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// Linear PCM samples
    pub pcm: Vec<i16>,
    /// Sample rate of `pcm` in Hz
    pub sample_rate: u32,
}

/// Synthesizes speech from text
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize `text`, optionally overriding the configured voice.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<SynthesizedAudio>;
}

/// OpenAI-style HTTP synthesis client requesting raw PCM output
pub struct HttpTextToSpeech {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    voice: String,
    speed: f32,
    /// Rate of the raw PCM the endpoint produces
    sample_rate: u32,
}

impl HttpTextToSpeech {
    /// Create a new TTS client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        voice: String,
        speed: f32,
        sample_rate: u32,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            voice,
            speed,
            sample_rate,
        })
    }
}

#[async_trait]
impl TextToSpeech for HttpTextToSpeech {
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<SynthesizedAudio> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            response_format: &'a str,
            speed: f32,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: voice.unwrap_or(&self.voice),
            // Raw little-endian 16-bit PCM, so the pipeline owns resampling.
            response_format: "pcm",
            speed: self.speed,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "TTS API error");
            return Err(Error::Tts(format!("TTS API error {status}: {body}")));
        }

        let raw = response.bytes().await?;
        let pcm: Vec<i16> = raw
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        tracing::debug!(
            samples = pcm.len(),
            sample_rate = self.sample_rate,
            "synthesis complete"
        );

        Ok(SynthesizedAudio {
            pcm,
            sample_rate: self.sample_rate,
        })
    }
}
