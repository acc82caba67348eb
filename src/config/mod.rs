//! Configuration management for the Parley bridge

pub mod file;

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::bridge::BridgeConfig;
use crate::segment::SegmenterConfig;
use crate::{Error, Result};

/// Service endpoint settings for STT
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Transcription endpoint URL
    pub endpoint: String,
    /// Model identifier (e.g. "whisper-1")
    pub model: String,
    /// Bearer token
    pub api_key: String,
}

/// Service endpoint settings for TTS
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Synthesis endpoint URL
    pub endpoint: String,
    /// Model identifier (e.g. "tts-1")
    pub model: String,
    /// Voice identifier (e.g. "alloy")
    pub voice: String,
    /// Speed multiplier (0.25 to 4.0)
    pub speed: f32,
    /// Sample rate of the raw PCM the endpoint produces
    pub sample_rate: u32,
    /// Bearer token
    pub api_key: String,
}

/// Service endpoint settings for reply generation
#[derive(Debug, Clone)]
pub struct ReplyConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Model identifier
    pub model: String,
    /// Bearer token
    pub api_key: String,
}

/// Parley bridge configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Conference server address (`host:port`)
    pub server: String,

    /// Speech segmentation thresholds
    pub segmenter: SegmenterConfig,

    /// Speech-to-text service
    pub stt: SttConfig,

    /// Text-to-speech service
    pub tts: TtsConfig,

    /// Reply-generation service
    pub reply: ReplyConfig,

    /// Turn-taking behavior
    pub bridge: BridgeConfig,

    /// Control-surface port
    pub api_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:64738".to_string(),
            segmenter: SegmenterConfig::default(),
            stt: SttConfig {
                endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
                model: "whisper-1".to_string(),
                api_key: String::new(),
            },
            tts: TtsConfig {
                endpoint: "https://api.openai.com/v1/audio/speech".to_string(),
                model: "tts-1".to_string(),
                voice: "alloy".to_string(),
                speed: 1.0,
                sample_rate: 24_000,
                api_key: String::new(),
            },
            reply: ReplyConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key: String::new(),
            },
            bridge: BridgeConfig::default(),
            api_port: 18590,
        }
    }
}

impl Config {
    /// Load configuration: defaults, overlaid with the TOML file, overlaid
    /// with environment variables for secrets.
    ///
    /// `PARLEY_API_KEY` fills any service key the file leaves empty;
    /// `PARLEY_STT_API_KEY`, `PARLEY_TTS_API_KEY`, and
    /// `PARLEY_REPLY_API_KEY` override per service.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit file path is unreadable or a value is
    /// out of range
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = file::load_config_file(path)?;
        let mut config = Self::default();

        if let Some(server) = file.transport.server {
            config.server = server;
        }

        if let Some(ms) = file.segmenter.min_speech_ms {
            config.segmenter.min_speech = Duration::from_millis(ms);
        }
        if let Some(ms) = file.segmenter.silence_timeout_ms {
            config.segmenter.silence_timeout = Duration::from_millis(ms);
        }
        if let Some(sources) = file.segmenter.allowed_sources {
            config.segmenter.allowed_sources = sources.into_iter().collect::<HashSet<u32>>();
        }

        apply(&mut config.stt.endpoint, file.stt.endpoint);
        apply(&mut config.stt.model, file.stt.model);
        apply(&mut config.stt.api_key, file.stt.api_key);

        apply(&mut config.tts.endpoint, file.tts.endpoint);
        apply(&mut config.tts.model, file.tts.model);
        apply(&mut config.tts.voice, file.tts.voice);
        apply(&mut config.tts.api_key, file.tts.api_key);
        if let Some(speed) = file.tts.speed {
            config.tts.speed = speed;
        }
        if let Some(rate) = file.tts.sample_rate {
            config.tts.sample_rate = rate;
        }

        apply(&mut config.reply.endpoint, file.reply.endpoint);
        apply(&mut config.reply.model, file.reply.model);
        apply(&mut config.reply.api_key, file.reply.api_key);

        if let Some(target) = file.bridge.voice_target {
            config.bridge.voice_target = target;
        }
        apply(&mut config.bridge.apology, file.bridge.apology);
        apply(&mut config.bridge.routing_key, file.bridge.routing_key);

        if let Some(port) = file.api.port {
            config.api_port = port;
        }

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Fill API keys from the environment
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("PARLEY_API_KEY") {
            for slot in [
                &mut self.stt.api_key,
                &mut self.tts.api_key,
                &mut self.reply.api_key,
            ] {
                if slot.is_empty() {
                    key.clone_into(slot);
                }
            }
        }
        for (var, slot) in [
            ("PARLEY_STT_API_KEY", &mut self.stt.api_key),
            ("PARLEY_TTS_API_KEY", &mut self.tts.api_key),
            ("PARLEY_REPLY_API_KEY", &mut self.reply.api_key),
        ] {
            if let Ok(key) = std::env::var(var) {
                *slot = key;
            }
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns error for out-of-range values
    pub fn validate(&self) -> Result<()> {
        if self.server.is_empty() {
            return Err(Error::Config("transport.server must be set".to_string()));
        }
        if self.bridge.voice_target > 31 {
            return Err(Error::Config(format!(
                "bridge.voice_target must fit 5 bits, got {}",
                self.bridge.voice_target
            )));
        }
        if !(0.25..=4.0).contains(&self.tts.speed) {
            return Err(Error::Config(format!(
                "tts.speed must be between 0.25 and 4.0, got {}",
                self.tts.speed
            )));
        }
        if self.tts.sample_rate == 0 {
            return Err(Error::Config("tts.sample_rate must be non-zero".to_string()));
        }
        if self.segmenter.silence_timeout.is_zero() {
            return Err(Error::Config(
                "segmenter.silence_timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn apply(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    fn altered(change: impl FnOnce(&mut Config)) -> Config {
        let mut config = Config::default();
        change(&mut config);
        config
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(altered(|c| c.bridge.voice_target = 32).validate().is_err());
        assert!(altered(|c| c.tts.speed = 9.0).validate().is_err());
        assert!(
            altered(|c| c.segmenter.silence_timeout = Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(altered(|c| c.server = String::new()).validate().is_err());
        assert!(altered(|c| c.tts.sample_rate = 0).validate().is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/parley.toml"))).is_err());
    }
}
