//! Segmenter worker task
//!
//! One task owns every speaker session, multiplexing packet intake and the
//! nearest silence deadline on a single `select!` loop. Nothing else touches
//! the session store, so a deadline can never fire concurrently with a
//! terminator for the same source.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::store::{SegmenterConfig, SessionStore};
use crate::protocol::{AudioPacket, PacketDecode};

/// A forwarded segment, ready for transcription
#[derive(Debug)]
pub struct Utterance {
    /// Speaker session id
    pub source: u32,
    /// Accumulated 48 kHz mono PCM
    pub pcm: Vec<i16>,
    /// Real-time duration of the audio
    pub duration: Duration,
}

/// Speech segmenter over a stream of raw audio frames
pub struct Segmenter {
    store: SessionStore,
    frames_rx: mpsc::Receiver<Vec<u8>>,
    utterance_tx: mpsc::Sender<Utterance>,
}

impl Segmenter {
    /// Create a segmenter consuming raw audio frames from `frames_rx` and
    /// forwarding completed utterances to `utterance_tx`.
    #[must_use]
    pub fn new(
        cfg: SegmenterConfig,
        frames_rx: mpsc::Receiver<Vec<u8>>,
        utterance_tx: mpsc::Sender<Utterance>,
    ) -> Self {
        Self {
            store: SessionStore::new(cfg),
            frames_rx,
            utterance_tx,
        }
    }

    /// Spawn the worker loop.
    ///
    /// The task runs until the frame channel closes (transport disconnect),
    /// then discards any sessions still accumulating — a disconnect never
    /// produces a flush.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        tracing::info!("segmenter started");

        loop {
            let deadline = self.store.next_deadline().map(tokio::time::Instant::from_std);
            let idle = tokio::time::Instant::now() + Duration::from_secs(3600);

            tokio::select! {
                frame = self.frames_rx.recv() => match frame {
                    Some(frame) => self.on_frame(&frame).await,
                    None => break,
                },
                () = tokio::time::sleep_until(deadline.unwrap_or(idle)), if deadline.is_some() => {
                    for flush in self.store.on_tick(tokio::time::Instant::now().into_std()) {
                        self.dispatch(flush).await;
                    }
                }
            }
        }

        self.store.clear();
        tracing::info!("segmenter stopped");
    }

    async fn on_frame(&mut self, frame: &[u8]) {
        match AudioPacket::decode(frame) {
            PacketDecode::Packet(packet) => {
                // The runtime clock, not the wall clock, so deadlines stay
                // coherent with `sleep_until` (and with the paused clock in
                // tests).
                let now = tokio::time::Instant::now().into_std();
                if let Some(flush) = self.store.on_packet(&packet, now) {
                    self.dispatch(flush).await;
                }
            }
            // The envelope delivers whole frames, so an incomplete packet is
            // as undecodable as a malformed one here.
            PacketDecode::Incomplete | PacketDecode::Malformed => {
                tracing::debug!(len = frame.len(), "dropping unparseable audio frame");
            }
        }
    }

    async fn dispatch(&mut self, flush: super::store::Flush) {
        if !self.store.should_forward(&flush) {
            tracing::debug!(
                source = flush.source,
                duration_ms = flush.duration.as_millis() as u64,
                "segment discarded without transcription"
            );
            return;
        }

        let utterance = Utterance {
            source: flush.source,
            pcm: flush.pcm,
            duration: flush.duration,
        };
        if self.utterance_tx.send(utterance).await.is_err() {
            tracing::warn!("utterance consumer dropped, segment lost");
        }
    }
}
