//! Voice session orchestration
//!
//! Drives a completed speech segment through transcription, reply
//! generation, synthesis, and back onto the wire at real-time pace:
//!
//! ```text
//! utterance PCM → WAV → STT → sanitize → reply agent → sanitize
//!     → TTS (synthesis-rate PCM) → resample to 48 kHz → 20 ms blocks
//!     → Opus encode (all-or-nothing) → audio packets (last = terminator)
//!     → paced transmit over the voice link
//! ```
//!
//! A failure before synthesis is audible as a short spoken apology; a
//! failure at synthesis or encoding is audible only as silence — no partial
//! audio is ever transmitted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use crate::audio::{
    self, FRAME_DURATION, FRAME_SIZE, SAMPLE_RATE, chunk_frames, pcm_to_wav, resample,
};
use crate::protocol::{AudioPacket, CODEC_OPUS};
use crate::reply::ReplyAgent;
use crate::sanitize::sanitize_for_speech;
use crate::segment::Utterance;
use crate::stt::SpeechToText;
use crate::transport::VoiceLink;
use crate::tts::TextToSpeech;
use crate::{Error, Result};

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Target field stamped on outbound frames (0 = normal speech)
    pub voice_target: u8,
    /// Spoken fallback when transcription or reply generation fails
    pub apology: String,
    /// Conversation scoping key passed to the reply agent
    pub routing_key: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            voice_target: crate::protocol::TARGET_NORMAL,
            apology: "Sorry, I did not catch that.".to_string(),
            routing_key: "voice".to_string(),
        }
    }
}

/// A transcribed utterance, delivered once per forwarded segment
#[derive(Debug, Clone)]
pub struct VoiceMessage {
    /// Speaker session id
    pub source: u32,
    /// Speaker label handed to the reply agent
    pub speaker: String,
    /// Sanitized transcript
    pub text: String,
    /// Utterance duration
    pub duration: Duration,
}

/// Outbound stream state: one encoder and one sequence counter, serialized
/// so concurrent replies never interleave frames
struct Outbound {
    encoder: audio::Encoder,
    sequence: u32,
}

/// Turn-taking orchestrator between the segmenter and the voice link
pub struct Orchestrator {
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
    agent: Arc<dyn ReplyAgent>,
    link: Arc<dyn VoiceLink>,
    cfg: BridgeConfig,
    outbound: Mutex<Outbound>,
    message_tx: mpsc::Sender<VoiceMessage>,
}

impl Orchestrator {
    /// Create an orchestrator along with the receiver for transcribed
    /// voice messages.
    ///
    /// # Errors
    ///
    /// Returns error if the outbound encoder cannot be created
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
        agent: Arc<dyn ReplyAgent>,
        link: Arc<dyn VoiceLink>,
        cfg: BridgeConfig,
    ) -> Result<(Self, mpsc::Receiver<VoiceMessage>)> {
        let (message_tx, message_rx) = mpsc::channel(64);
        let orchestrator = Self {
            stt,
            tts,
            agent,
            link,
            cfg,
            outbound: Mutex::new(Outbound {
                encoder: audio::Encoder::new()?,
                sequence: 0,
            }),
            message_tx,
        };
        Ok((orchestrator, message_rx))
    }

    /// Run one utterance through the full listen→reply→speak turn.
    ///
    /// Never returns an error: every failure mode ends inside, as either a
    /// spoken apology or logged silence.
    pub async fn handle_utterance(&self, utterance: Utterance) {
        let source = utterance.source;
        let speaker = format!("speaker-{source}");

        let wav = match pcm_to_wav(&utterance.pcm, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::error!(source, error = %e, "failed to wrap utterance for transcription");
                return;
            }
        };

        let transcript = match self.stt.transcribe(&wav).await {
            Ok(text) => sanitize_for_speech(&text),
            Err(e) => {
                tracing::warn!(source, error = %e, "transcription failed");
                self.speak_apology().await;
                return;
            }
        };

        if transcript.is_empty() {
            tracing::debug!(source, "empty transcript, nothing to forward");
            return;
        }

        let message = VoiceMessage {
            source,
            speaker: speaker.clone(),
            text: transcript.clone(),
            duration: utterance.duration,
        };
        if self.message_tx.send(message).await.is_err() {
            tracing::debug!("voice message consumer dropped");
        }

        let reply = match self
            .agent
            .reply(&speaker, &transcript, &self.cfg.routing_key)
            .await
        {
            Ok(text) => sanitize_for_speech(&text),
            Err(e) => {
                tracing::warn!(source, error = %e, "reply generation failed");
                self.speak_apology().await;
                return;
            }
        };

        if reply.is_empty() {
            tracing::debug!(source, "empty reply, staying quiet");
            return;
        }

        if let Err(e) = self.speak(&reply, None).await {
            tracing::warn!(source, error = %e, "reply playback aborted");
        }
    }

    /// Synthesize `text` and transmit it into the channel at real-time pace.
    ///
    /// This is also the entry point for the external "speak now" control
    /// surface, which bypasses listening entirely.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis, encoding, or transmission fails; when
    /// synthesis or encoding fails, nothing has been transmitted
    pub async fn speak(&self, text: &str, voice: Option<&str>) -> Result<()> {
        let synthesized = self.tts.synthesize(text, voice).await?;
        let pcm = resample(&synthesized.pcm, synthesized.sample_rate, SAMPLE_RATE);
        let blocks = chunk_frames(&pcm, FRAME_SIZE);
        if blocks.is_empty() {
            return Ok(());
        }

        let mut outbound = self.outbound.lock().await;

        // Encode every block before sending anything: an encoder failure
        // must not leave a half-spoken utterance on the wire.
        let mut payloads = Vec::with_capacity(blocks.len());
        for block in &blocks {
            payloads.push(outbound.encoder.encode(block)?);
        }

        tracing::debug!(
            frames = payloads.len(),
            duration_ms = payloads.len() as u64 * FRAME_DURATION.as_millis() as u64,
            "transmitting synthesized speech"
        );

        let last = payloads.len() - 1;
        for (i, payload) in payloads.into_iter().enumerate() {
            let packet = AudioPacket {
                codec: CODEC_OPUS,
                target: self.cfg.voice_target,
                source: None,
                sequence: outbound.sequence,
                payload,
                terminator: i == last,
            };
            outbound.sequence = outbound.sequence.wrapping_add(1);

            self.link
                .send_audio(&packet.encode())
                .await
                .map_err(|e| Error::Transport(format!("frame {i}: {e}")))?;

            // One frame per frame-duration keeps the far end's jitter buffer
            // from overrunning.
            tokio::time::sleep(FRAME_DURATION).await;
        }

        Ok(())
    }

    async fn speak_apology(&self) {
        if let Err(e) = self.speak(&self.cfg.apology, None).await {
            tracing::warn!(error = %e, "apology playback failed");
        }
    }
}
