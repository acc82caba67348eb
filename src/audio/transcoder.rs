//! Opus transcoding between wire payloads and linear PCM

use crate::{Error, Result};

use super::{FRAME_SIZE, SAMPLE_RATE};

/// Encoder target bitrate in bits per second
const BITRATE: i32 = 48_000;

/// Largest decodable frame: 120 ms at 48 kHz
const MAX_DECODE_SAMPLES: usize = 5760;

/// Upper bound for one encoded frame
const MAX_ENCODED_LEN: usize = 4000;

/// Stateful Opus decoder for one speaker's stream.
///
/// Decoder state carries across calls, so each source needs its own instance
/// for the lifetime of its stream.
pub struct Decoder {
    inner: opus::Decoder,
}

impl Decoder {
    /// Create a decoder producing 48 kHz mono PCM.
    ///
    /// # Errors
    ///
    /// Returns error if the codec rejects the configuration
    pub fn new() -> Result<Self> {
        let inner = opus::Decoder::new(SAMPLE_RATE, opus::Channels::Mono)
            .map_err(|e| Error::Codec(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Decode one wire payload to PCM samples.
    ///
    /// # Errors
    ///
    /// Returns error on malformed payloads; callers drop the frame and keep
    /// the stream going
    pub fn decode(&mut self, payload: &[u8]) -> Result<Vec<i16>> {
        let mut pcm = vec![0i16; MAX_DECODE_SAMPLES];
        let n = self
            .inner
            .decode(payload, &mut pcm, false)
            .map_err(|e| Error::Codec(e.to_string()))?;
        pcm.truncate(n);
        Ok(pcm)
    }
}

/// Opus encoder for the outbound voice stream
pub struct Encoder {
    inner: opus::Encoder,
}

impl Encoder {
    /// Create a voice-tuned encoder at the fixed target bitrate.
    ///
    /// # Errors
    ///
    /// Returns error if the codec rejects the configuration
    pub fn new() -> Result<Self> {
        let mut inner =
            opus::Encoder::new(SAMPLE_RATE, opus::Channels::Mono, opus::Application::Voip)
                .map_err(|e| Error::Codec(e.to_string()))?;
        inner
            .set_bitrate(opus::Bitrate::Bits(BITRATE))
            .map_err(|e| Error::Codec(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Encode exactly one 960-sample frame.
    ///
    /// The frame chunker guarantees fixed-size blocks, zero-padding the tail
    /// of an utterance; any other length is a caller contract violation.
    ///
    /// # Errors
    ///
    /// Returns error for wrong block lengths or codec failures
    pub fn encode(&mut self, pcm: &[i16]) -> Result<Vec<u8>> {
        if pcm.len() != FRAME_SIZE {
            return Err(Error::Codec(format!(
                "encoder frame must be {FRAME_SIZE} samples, got {}",
                pcm.len()
            )));
        }
        let mut out = vec![0u8; MAX_ENCODED_LEN];
        let n = self
            .inner
            .encode(pcm, &mut out)
            .map_err(|e| Error::Codec(e.to_string()))?;
        out.truncate(n);
        Ok(out)
    }
}
