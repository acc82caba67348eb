//! Daemon - the running bridge service
//!
//! Wires the voice tunnel, segmenter, orchestrator, and control surface
//! together and tears them down in order on shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{self, ApiState};
use crate::bridge::{Orchestrator, VoiceMessage};
use crate::reply::HttpReplyAgent;
use crate::segment::{Segmenter, Utterance};
use crate::stt::HttpSpeechToText;
use crate::transport::{TcpTunnel, VoiceLink};
use crate::tts::HttpTextToSpeech;
use crate::{Config, Result};

/// Queue depth for one speaker's pending utterances
const LANE_CAPACITY: usize = 8;

/// The Parley daemon - bridges the voice channel and the reply service
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a new daemon instance
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until ctrl-c.
    ///
    /// # Errors
    ///
    /// Returns error if a collaborator client cannot be built, the tunnel
    /// cannot connect, or the control surface fails
    pub async fn run(self) -> Result<()> {
        let config = self.config;

        let stt = Arc::new(HttpSpeechToText::new(
            config.stt.endpoint.clone(),
            config.stt.api_key.clone(),
            config.stt.model.clone(),
        )?);
        let tts = Arc::new(HttpTextToSpeech::new(
            config.tts.endpoint.clone(),
            config.tts.api_key.clone(),
            config.tts.model.clone(),
            config.tts.voice.clone(),
            config.tts.speed,
            config.tts.sample_rate,
        )?);
        let agent = Arc::new(HttpReplyAgent::new(
            config.reply.endpoint.clone(),
            config.reply.api_key.clone(),
            config.reply.model.clone(),
        )?);

        let (tunnel, frames_rx) = TcpTunnel::with_receiver(config.server.clone());
        let link: Arc<dyn VoiceLink> = Arc::new(tunnel);
        link.connect().await?;

        let (utterance_tx, utterance_rx) = mpsc::channel(32);
        let segmenter = Segmenter::new(config.segmenter.clone(), frames_rx, utterance_tx).spawn();

        let (orchestrator, message_rx) = Orchestrator::new(
            stt,
            tts,
            agent,
            Arc::clone(&link),
            config.bridge.clone(),
        )?;
        let orchestrator = Arc::new(orchestrator);

        tokio::spawn(log_voice_messages(message_rx));
        let dispatcher = tokio::spawn(dispatch_utterances(
            utterance_rx,
            Arc::clone(&orchestrator),
        ));

        let state = Arc::new(ApiState {
            orchestrator,
            link: Arc::clone(&link),
        });
        api::serve(state, config.api_port, async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;

        // Disconnecting closes the frame channel; the segmenter then drops
        // its sessions (cancelling every silence deadline) and exits, and
        // the dispatcher drains behind it.
        link.disconnect().await?;
        let _ = segmenter.await;
        let _ = dispatcher.await;

        tracing::info!("parley stopped");
        Ok(())
    }
}

/// Fan utterances out to one serial lane per speaker.
///
/// A speaker's utterances are replied to in flush order; different speakers
/// never wait on each other's transcription or synthesis latency.
async fn dispatch_utterances(
    mut utterance_rx: mpsc::Receiver<Utterance>,
    orchestrator: Arc<Orchestrator>,
) {
    let mut lanes: HashMap<u32, mpsc::Sender<Utterance>> = HashMap::new();

    while let Some(utterance) = utterance_rx.recv().await {
        let source = utterance.source;
        let lane = lanes.entry(source).or_insert_with(|| {
            let (tx, mut rx) = mpsc::channel::<Utterance>(LANE_CAPACITY);
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                while let Some(utterance) = rx.recv().await {
                    orchestrator.handle_utterance(utterance).await;
                }
            });
            tx
        });

        if lane.send(utterance).await.is_err() {
            tracing::warn!(source, "speaker lane died, dropping utterance");
            lanes.remove(&source);
        }
    }
    // Utterance stream ended: dropping the lane senders winds the lanes down.
}

/// Log transcribed turns as they complete
async fn log_voice_messages(mut message_rx: mpsc::Receiver<VoiceMessage>) {
    while let Some(message) = message_rx.recv().await {
        tracing::info!(
            source = message.source,
            speaker = %message.speaker,
            duration_ms = message.duration.as_millis() as u64,
            text = %message.text,
            "voice message"
        );
    }
}
