//! Fixed-size framing for the encoder

/// Split PCM into consecutive `frame_size` blocks.
///
/// Yields `ceil(len / frame_size)` blocks, all exactly `frame_size` samples;
/// the final block is zero-padded to full length. An empty buffer yields no
/// blocks.
#[must_use]
pub fn chunk_frames(pcm: &[i16], frame_size: usize) -> Vec<Vec<i16>> {
    assert!(frame_size > 0, "frame size must be non-zero");

    pcm.chunks(frame_size)
        .map(|chunk| {
            let mut block = chunk.to_vec();
            block.resize(frame_size, 0);
            block
        })
        .collect()
}
