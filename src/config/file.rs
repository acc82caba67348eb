//! TOML configuration file loading
//!
//! Supports `~/.config/parley/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of
//! defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ParleyConfigFile {
    /// Voice transport configuration
    #[serde(default)]
    pub transport: TransportFileConfig,

    /// Speech segmentation thresholds
    #[serde(default)]
    pub segmenter: SegmenterFileConfig,

    /// Speech-to-text service
    #[serde(default)]
    pub stt: SttFileConfig,

    /// Text-to-speech service
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// Reply-generation service
    #[serde(default)]
    pub reply: ReplyFileConfig,

    /// Turn-taking behavior
    #[serde(default)]
    pub bridge: BridgeFileConfig,

    /// Control-surface server
    #[serde(default)]
    pub api: ApiFileConfig,
}

/// Voice transport configuration
#[derive(Debug, Default, Deserialize)]
pub struct TransportFileConfig {
    /// Conference server address (`host:port`)
    pub server: Option<String>,
}

/// Speech segmentation thresholds
#[derive(Debug, Default, Deserialize)]
pub struct SegmenterFileConfig {
    /// Utterances shorter than this are never transcribed
    pub min_speech_ms: Option<u64>,

    /// Inactivity after which an utterance is force-flushed
    pub silence_timeout_ms: Option<u64>,

    /// Source session ids allowed to talk to the bridge (empty = everyone)
    pub allowed_sources: Option<Vec<u32>>,
}

/// Speech-to-text service configuration
#[derive(Debug, Default, Deserialize)]
pub struct SttFileConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

/// Text-to-speech service configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
    /// Sample rate of the raw PCM the endpoint produces
    pub sample_rate: Option<u32>,
    pub api_key: Option<String>,
}

/// Reply-generation service configuration
#[derive(Debug, Default, Deserialize)]
pub struct ReplyFileConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

/// Turn-taking configuration
#[derive(Debug, Default, Deserialize)]
pub struct BridgeFileConfig {
    /// Outbound routing target (0 = normal speech, 1–30 = whisper groups)
    pub voice_target: Option<u8>,

    /// Spoken fallback line for transcription/reply failures
    pub apology: Option<String>,

    /// Conversation scoping key passed to the reply service
    pub routing_key: Option<String>,
}

/// Control-surface configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiFileConfig {
    /// Control-surface port
    pub port: Option<u16>,
}

/// Load the TOML config file.
///
/// An explicit `path` must exist and parse. With no path, the standard
/// location is used when present, and a missing or unparseable file falls
/// back to defaults with a warning.
///
/// # Errors
///
/// Returns error when an explicit path cannot be read or parsed
pub fn load_config_file(path: Option<&Path>) -> Result<ParleyConfigFile> {
    if let Some(path) = path {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        let config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "loaded config file");
        return Ok(config);
    }

    let Some(path) = config_file_path() else {
        return Ok(ParleyConfigFile::default());
    };

    if !path.exists() {
        return Ok(ParleyConfigFile::default());
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                Ok(config)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                Ok(ParleyConfigFile::default())
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            Ok(ParleyConfigFile::default())
        }
    }
}

/// Return the config file path: `~/.config/parley/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("parley").join("config.toml"))
}
