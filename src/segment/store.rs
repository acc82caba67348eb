//! Per-speaker session records and the segmentation state machine
//!
//! The store is synchronous and clock-injected: callers pass `Instant`s in,
//! which keeps every transition deterministic under test. The worker task in
//! [`super::worker`] owns the store, so creation, append, and flush are
//! serialized per source by construction.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::audio::{self, Decoder};
use crate::protocol::AudioPacket;

/// Segmentation thresholds and forwarding policy
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Utterances shorter than this are flushed but never transcribed
    pub min_speech: Duration,
    /// Inactivity after which an un-terminated utterance is force-flushed
    pub silence_timeout: Duration,
    /// When non-empty, only these sources are forwarded for transcription;
    /// everyone else's audio is still decoded and segmented
    pub allowed_sources: HashSet<u32>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_speech: Duration::from_millis(500),
            silence_timeout: Duration::from_millis(1500),
            allowed_sources: HashSet::new(),
        }
    }
}

/// What ended an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// The speaker's stream carried an explicit end-of-utterance frame
    Terminator,
    /// The silence deadline expired with no further audio
    SilenceTimeout,
}

/// A completed segment, drained from its session exactly once
#[derive(Debug)]
pub struct Flush {
    /// Speaker session id
    pub source: u32,
    /// Accumulated 48 kHz mono PCM
    pub pcm: Vec<i16>,
    /// Real-time duration of the accumulated audio
    pub duration: Duration,
    /// What caused the flush
    pub trigger: FlushTrigger,
}

/// One live speaker: Accumulating from first packet until flush.
///
/// The buffer is only extended while the session exists and is drained
/// exactly once, by terminator or by deadline, never both: both paths remove
/// the record, and removal cancels the deadline atomically.
struct SpeakerSession {
    decoder: Decoder,
    pcm: Vec<i16>,
    last_activity: Instant,
    deadline: Option<Instant>,
}

impl SpeakerSession {
    fn new(now: Instant, silence_timeout: Duration) -> crate::Result<Self> {
        Ok(Self {
            decoder: Decoder::new()?,
            pcm: Vec::new(),
            last_activity: now,
            // Armed from the start so a session whose first frames all fail
            // to decode still times out instead of lingering.
            deadline: Some(now + silence_timeout),
        })
    }
}

/// All live sessions, keyed by source id
pub struct SessionStore {
    cfg: SegmenterConfig,
    sessions: HashMap<u32, SpeakerSession>,
}

impl SessionStore {
    #[must_use]
    pub fn new(cfg: SegmenterConfig) -> Self {
        Self {
            cfg,
            sessions: HashMap::new(),
        }
    }

    /// Feed one parsed audio packet into the state machine.
    ///
    /// First packet from a source creates its session; every packet appends
    /// decoded PCM and re-arms the silence deadline; a terminator cancels
    /// the deadline and flushes immediately, regardless of accumulated
    /// duration (duration only gates forwarding, not flushing). Decode
    /// failures drop the frame and leave the buffer and deadline untouched.
    pub fn on_packet(&mut self, packet: &AudioPacket, now: Instant) -> Option<Flush> {
        let source = packet.source?;

        let silence_timeout = self.cfg.silence_timeout;
        let session = match self.sessions.entry(source) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => match SpeakerSession::new(now, silence_timeout) {
                Ok(session) => {
                    tracing::debug!(source, "speaker session opened");
                    entry.insert(session)
                }
                Err(e) => {
                    tracing::warn!(source, error = %e, "failed to open decoder for source");
                    return None;
                }
            },
        };

        match session.decoder.decode(&packet.payload) {
            Ok(pcm) => session.pcm.extend_from_slice(&pcm),
            Err(e) => {
                tracing::debug!(source, error = %e, "dropping undecodable frame");
                return None;
            }
        }
        session.last_activity = now;

        if packet.terminator {
            // Removing the record disarms the deadline before the state
            // leaves Accumulating, so a pending timer can never double-flush.
            self.take_flush(source, FlushTrigger::Terminator, now)
        } else {
            session.deadline = Some(now + self.cfg.silence_timeout);
            None
        }
    }

    /// Flush every session whose silence deadline has passed.
    pub fn on_tick(&mut self, now: Instant) -> Vec<Flush> {
        let expired: Vec<u32> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.deadline.is_some_and(|d| d <= now))
            .map(|(source, _)| *source)
            .collect();

        expired
            .into_iter()
            .filter_map(|source| self.take_flush(source, FlushTrigger::SilenceTimeout, now))
            .collect()
    }

    /// The nearest armed silence deadline, if any session is accumulating.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sessions.values().filter_map(|s| s.deadline).min()
    }

    /// Whether a flushed segment should reach transcription.
    ///
    /// Short utterances and sources off a non-empty allow-list are flushed
    /// like any other but their audio goes no further.
    #[must_use]
    pub fn should_forward(&self, flush: &Flush) -> bool {
        flush.duration >= self.cfg.min_speech
            && (self.cfg.allowed_sources.is_empty()
                || self.cfg.allowed_sources.contains(&flush.source))
    }

    /// Drop every session without flushing; used on transport disconnect.
    pub fn clear(&mut self) {
        if !self.sessions.is_empty() {
            tracing::debug!(sessions = self.sessions.len(), "discarding live sessions");
        }
        self.sessions.clear();
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether any session is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn take_flush(&mut self, source: u32, trigger: FlushTrigger, now: Instant) -> Option<Flush> {
        let session = self.sessions.remove(&source)?;
        let duration = audio::pcm_duration(session.pcm.len());
        let idle_ms = now.duration_since(session.last_activity).as_millis() as u64;
        tracing::debug!(source, ?trigger, ?duration, idle_ms, "utterance flushed");
        Some(Flush {
            source,
            pcm: session.pcm,
            duration,
            trigger,
        })
    }
}
