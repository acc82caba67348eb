//! Audio pipeline: Opus transcoding, resampling, framing, WAV wrapping
//!
//! Everything on the voice wire is 48 kHz mono 16-bit PCM in 20 ms frames;
//! synthesis output arrives at its own rate and is resampled up before
//! encoding.

mod chunker;
mod resampler;
mod transcoder;
mod wav;

pub use chunker::chunk_frames;
pub use resampler::resample;
pub use transcoder::{Decoder, Encoder};
pub use wav::pcm_to_wav;

use std::time::Duration;

/// Transport sample rate in Hz
pub const SAMPLE_RATE: u32 = 48_000;

/// Samples per encoder frame (20 ms at 48 kHz)
pub const FRAME_SIZE: usize = 960;

/// Real-time duration of one encoder frame
pub const FRAME_DURATION: Duration = Duration::from_millis(20);

/// Real-time duration of a mono PCM buffer at the transport rate.
#[must_use]
pub fn pcm_duration(samples: usize) -> Duration {
    Duration::from_micros(samples as u64 * 1_000_000 / u64::from(SAMPLE_RATE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_constants_agree() {
        assert_eq!(pcm_duration(FRAME_SIZE), FRAME_DURATION);
        assert_eq!(pcm_duration(SAMPLE_RATE as usize), Duration::from_secs(1));
        assert_eq!(pcm_duration(0), Duration::ZERO);
    }
}
