//! Audio pipeline integration tests
//!
//! Tests the synthesis-to-wire path without audio hardware or network:
//! resample → chunk → Opus encode → packetize → decode back.

use parley_bridge::audio::{
    self, Decoder, Encoder, FRAME_SIZE, SAMPLE_RATE, chunk_frames, pcm_to_wav, resample,
};
use parley_bridge::protocol::{AudioPacket, CODEC_OPUS, PacketDecode, TARGET_NORMAL};

/// Generate sine wave samples
fn sine(sample_rate: u32, duration_secs: f32, amplitude: f32) -> Vec<i16> {
    let num_samples = (sample_rate as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (amplitude * (2.0 * std::f32::consts::PI * 220.0 * t).sin() * 32767.0) as i16
        })
        .collect()
}

#[test]
fn resample_lengths_match_the_rate_ratio() {
    let half_second = sine(24_000, 0.5, 0.4);
    assert_eq!(half_second.len(), 12_000);

    let up = resample(&half_second, 24_000, 48_000);
    assert_eq!(up.len(), 24_000);

    let back = resample(&up, 48_000, 24_000);
    assert!(back.len().abs_diff(half_second.len()) <= 1);
}

#[test]
fn chunking_covers_every_sample_exactly_once() {
    let tone = sine(SAMPLE_RATE, 0.2, 0.3);
    let pcm = &tone[..5000]; // not a frame multiple
    let blocks = chunk_frames(pcm, FRAME_SIZE);

    assert_eq!(blocks.len(), pcm.len().div_ceil(FRAME_SIZE));
    assert!(blocks.iter().all(|b| b.len() == FRAME_SIZE));

    let padding = blocks.len() * FRAME_SIZE - pcm.len();
    let tail = blocks.last().unwrap();
    assert!(tail[FRAME_SIZE - padding..].iter().all(|&s| s == 0));

    let rejoined: Vec<i16> = blocks.concat();
    assert_eq!(&rejoined[..pcm.len()], &pcm[..]);
}

#[test]
fn synthesis_to_wire_and_back() {
    // A synthesized reply at 24 kHz...
    let reply = sine(24_000, 0.2, 0.35);

    // ...resampled, framed, encoded, packetized...
    let pcm = resample(&reply, 24_000, SAMPLE_RATE);
    let blocks = chunk_frames(&pcm, FRAME_SIZE);
    let mut encoder = Encoder::new().unwrap();

    let frames: Vec<Vec<u8>> = blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            AudioPacket {
                codec: CODEC_OPUS,
                target: TARGET_NORMAL,
                source: None,
                sequence: i as u32,
                payload: encoder.encode(block).unwrap(),
                terminator: i == blocks.len() - 1,
            }
            .encode()
        })
        .collect();

    assert_eq!(frames.len(), blocks.len());

    // ...comes back out as the same amount of audio when decoded the way a
    // receiving client would (source id stamped by the server).
    let mut decoder = Decoder::new().unwrap();
    let mut received = 0usize;
    let mut terminators = 0usize;

    for frame in &frames {
        let mut stamped = Vec::with_capacity(frame.len() + 1);
        stamped.push(frame[0]);
        stamped.push(77); // single-byte varint source id
        stamped.extend_from_slice(&frame[1..]);

        let PacketDecode::Packet(packet) = AudioPacket::decode(&stamped) else {
            panic!("stamped frame should parse");
        };
        assert_eq!(packet.source, Some(77));
        received += decoder.decode(&packet.payload).unwrap().len();
        if packet.terminator {
            terminators += 1;
        }
    }

    assert_eq!(received, blocks.len() * FRAME_SIZE);
    assert_eq!(terminators, 1);
}

#[test]
fn wav_container_is_ready_for_transcription_handoff() {
    let pcm = sine(SAMPLE_RATE, 0.1, 0.5);
    let wav = pcm_to_wav(&pcm, SAMPLE_RATE).unwrap();

    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");
    assert_eq!(wav.len(), 44 + pcm.len() * 2);
}

#[test]
fn frame_duration_matches_real_time_pacing() {
    assert_eq!(audio::pcm_duration(FRAME_SIZE), audio::FRAME_DURATION);
    // One second of speech is fifty paced frames.
    let second = vec![0i16; SAMPLE_RATE as usize];
    assert_eq!(chunk_frames(&second, FRAME_SIZE).len(), 50);
}
