//! Parley - voice conference bridge for AI assistants
//!
//! Parley joins a multi-party voice channel, listens to each speaker,
//! transcribes finished utterances, asks a reply service for an answer, and
//! speaks the answer back into the channel as synthesized audio.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │              Voice conference server               │
//! └──────────────────────┬─────────────────────────────┘
//!                        │ tunneled audio frames
//! ┌──────────────────────▼─────────────────────────────┐
//! │                  Parley bridge                     │
//! │  packet codec │ Opus │ segmenter │ orchestrator    │
//! └──────────────────────┬─────────────────────────────┘
//!                        │ HTTP
//! ┌──────────────────────▼─────────────────────────────┐
//! │         STT  │  reply service  │  TTS              │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Audio flows in as codec frames, is decoded to PCM and accumulated per
//! speaker until a terminator frame or silence deadline, then runs the
//! listen→reply→speak turn; replies are re-encoded into 20 ms frames and
//! paced back onto the wire in real time.

pub mod api;
pub mod audio;
pub mod bridge;
pub mod config;
pub mod daemon;
pub mod error;
pub mod protocol;
pub mod reply;
pub mod sanitize;
pub mod segment;
pub mod stt;
pub mod transport;
pub mod tts;

pub use bridge::{BridgeConfig, Orchestrator, VoiceMessage};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use protocol::{AudioPacket, PacketDecode};
pub use reply::ReplyAgent;
pub use sanitize::sanitize_for_speech;
pub use segment::{Segmenter, SegmenterConfig, Utterance};
pub use stt::SpeechToText;
pub use transport::{TcpTunnel, VoiceLink};
pub use tts::{SynthesizedAudio, TextToSpeech};
