//! End-to-end segmentation scenarios under virtual time
//!
//! Drives the segmenter worker through its public channel interface the way
//! the transport does, with the tokio clock paused for determinism.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc;

use parley_bridge::audio::{Encoder, FRAME_SIZE};
use parley_bridge::protocol::{AudioPacket, CODEC_OPUS, TARGET_NORMAL};
use parley_bridge::segment::{Segmenter, SegmenterConfig, Utterance};

fn config(min_ms: u64, silence_ms: u64, allowed: &[u32]) -> SegmenterConfig {
    SegmenterConfig {
        min_speech: Duration::from_millis(min_ms),
        silence_timeout: Duration::from_millis(silence_ms),
        allowed_sources: allowed.iter().copied().collect::<HashSet<u32>>(),
    }
}

fn audio_frame(source: u32, sequence: u32, payload: Vec<u8>, terminator: bool) -> Vec<u8> {
    AudioPacket {
        codec: CODEC_OPUS,
        target: TARGET_NORMAL,
        source: Some(source),
        sequence,
        payload,
        terminator,
    }
    .encode()
}

fn opus_silence() -> Vec<u8> {
    Encoder::new().unwrap().encode(&[0i16; FRAME_SIZE]).unwrap()
}

struct Harness {
    frames_tx: mpsc::Sender<Vec<u8>>,
    utterances: mpsc::Receiver<Utterance>,
    worker: tokio::task::JoinHandle<()>,
}

fn start(cfg: SegmenterConfig) -> Harness {
    let (frames_tx, frames_rx) = mpsc::channel(64);
    let (utterance_tx, utterances) = mpsc::channel(64);
    let worker = Segmenter::new(cfg, frames_rx, utterance_tx).spawn();
    Harness {
        frames_tx,
        utterances,
        worker,
    }
}

#[tokio::test(start_paused = true)]
async fn a_speaker_turn_flushes_on_silence_and_only_once() {
    let mut harness = start(config(0, 1500, &[]));
    let payload = opus_silence();

    // Five 20 ms frames, then the speaker goes quiet.
    for sequence in 0..5 {
        harness
            .frames_tx
            .send(audio_frame(10, sequence, payload.clone(), false))
            .await
            .unwrap();
    }

    tokio::time::sleep(Duration::from_millis(1600)).await;
    let utterance = harness.utterances.recv().await.expect("silence flush");
    assert_eq!(utterance.source, 10);
    assert_eq!(utterance.pcm.len(), 5 * FRAME_SIZE);
    assert_eq!(utterance.duration, Duration::from_millis(100));

    // Long after, still exactly one flush.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(harness.utterances.try_recv().is_err());

    drop(harness.frames_tx);
    harness.worker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn sub_minimum_audio_never_reaches_transcription() {
    let mut harness = start(config(500, 1000, &[]));
    let payload = opus_silence();

    // 60 ms of speech against a 500 ms minimum, ended by terminator.
    for sequence in 0..2 {
        harness
            .frames_tx
            .send(audio_frame(3, sequence, payload.clone(), false))
            .await
            .unwrap();
    }
    harness
        .frames_tx
        .send(audio_frame(3, 2, payload, true))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(harness.utterances.try_recv().is_err());

    drop(harness.frames_tx);
    harness.worker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn terminator_beats_the_silence_deadline() {
    let mut harness = start(config(0, 5000, &[]));

    harness
        .frames_tx
        .send(audio_frame(8, 0, opus_silence(), true))
        .await
        .unwrap();

    // Flush arrives immediately, not five seconds later.
    let utterance =
        tokio::time::timeout(Duration::from_millis(100), harness.utterances.recv())
            .await
            .expect("flush before the deadline")
            .expect("utterance");
    assert_eq!(utterance.source, 8);

    drop(harness.frames_tx);
    harness.worker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn late_terminator_after_timeout_opens_a_fresh_utterance() {
    let mut harness = start(config(0, 1000, &[]));
    let payload = opus_silence();

    harness
        .frames_tx
        .send(audio_frame(5, 0, payload.clone(), false))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let first = harness.utterances.recv().await.expect("timeout flush");
    assert_eq!(first.pcm.len(), FRAME_SIZE);

    // The terminator that arrives after the timeout starts (and ends) a new
    // utterance rather than touching the flushed one.
    harness
        .frames_tx
        .send(audio_frame(5, 1, payload, true))
        .await
        .unwrap();
    let second = harness.utterances.recv().await.expect("terminator flush");
    assert_eq!(second.pcm.len(), FRAME_SIZE);

    drop(harness.frames_tx);
    harness.worker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn interleaved_speakers_keep_separate_buffers() {
    let mut harness = start(config(0, 2000, &[]));
    let payload = opus_silence();

    // Two speakers talk over each other; one finishes with a terminator.
    for sequence in 0..3 {
        for source in [21, 22] {
            harness
                .frames_tx
                .send(audio_frame(source, sequence, payload.clone(), false))
                .await
                .unwrap();
        }
    }
    harness
        .frames_tx
        .send(audio_frame(21, 3, payload, true))
        .await
        .unwrap();

    let first = harness.utterances.recv().await.expect("terminator flush");
    assert_eq!(first.source, 21);
    assert_eq!(first.pcm.len(), 4 * FRAME_SIZE);

    tokio::time::sleep(Duration::from_millis(2100)).await;
    let second = harness.utterances.recv().await.expect("timeout flush");
    assert_eq!(second.source, 22);
    assert_eq!(second.pcm.len(), 3 * FRAME_SIZE);

    drop(harness.frames_tx);
    harness.worker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn allow_list_filters_speakers_without_stalling_their_sessions() {
    let mut harness = start(config(0, 1000, &[30]));
    let payload = opus_silence();

    harness
        .frames_tx
        .send(audio_frame(30, 0, payload.clone(), true))
        .await
        .unwrap();
    harness
        .frames_tx
        .send(audio_frame(31, 0, payload, true))
        .await
        .unwrap();

    let utterance = harness.utterances.recv().await.expect("allowed flush");
    assert_eq!(utterance.source, 30);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(harness.utterances.try_recv().is_err());

    drop(harness.frames_tx);
    harness.worker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn disconnect_cancels_pending_deadlines_without_flushing() {
    let mut harness = start(config(0, 1500, &[]));

    harness
        .frames_tx
        .send(audio_frame(2, 0, opus_silence(), false))
        .await
        .unwrap();
    tokio::task::yield_now().await;

    // The transport goes away before the silence deadline fires.
    drop(harness.frames_tx);
    harness.worker.await.unwrap();

    assert!(harness.utterances.recv().await.is_none());
}
