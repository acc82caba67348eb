//! Audio frame parse/build for the voice transport
//!
//! Frame layout (inside the tunneled-audio envelope):
//!
//! ```text
//! byte 0  : header = (codec << 5) | target
//! varint  : source session id        (server→client frames only)
//! varint  : sequence number
//! varint  : (terminator << 13) | payload length   (primary codec only)
//! bytes   : payload
//! ```
//!
//! Sequence numbers are carried through but not used for reassembly; loss
//! and reordering on the transport pass through as best-effort behavior.

use super::varint;

/// Codec id of the primary voice codec (Opus)
pub const CODEC_OPUS: u8 = 4;

/// Target for normal speech
pub const TARGET_NORMAL: u8 = 0;

/// Target for server loopback
pub const TARGET_LOOPBACK: u8 = 31;

/// Terminator flag bit inside the primary codec's length varint
const TERMINATOR_BIT: u32 = 0x2000;

/// Payload length mask inside the primary codec's length varint
const LENGTH_MASK: u32 = 0x1FFF;

/// One audio frame on the voice wire.
///
/// `source` is present on parsed server→client frames and `None` on frames
/// built for transmission, where the server stamps the session id itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPacket {
    /// 3-bit codec id
    pub codec: u8,
    /// 5-bit routing target: 0 normal, 1–30 whisper groups, 31 loopback
    pub target: u8,
    /// Speaker session id, when the frame came from the server
    pub source: Option<u32>,
    /// Per-source frame counter
    pub sequence: u32,
    /// Codec-specific payload bytes
    pub payload: Vec<u8>,
    /// Marks the last frame of an utterance (primary codec only)
    pub terminator: bool,
}

/// Outcome of parsing a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketDecode {
    /// A complete frame
    Packet(AudioPacket),
    /// The declared payload length exceeds the remaining bytes; callers on a
    /// fragmenting transport may buffer and retry, others drop the frame
    Incomplete,
    /// The frame cannot be parsed at all
    Malformed,
}

impl AudioPacket {
    /// Parse a server→client audio frame.
    ///
    /// Never panics and never returns a Rust error: malformed and short
    /// frames come back as [`PacketDecode::Malformed`] /
    /// [`PacketDecode::Incomplete`] so the read loop can drop them and
    /// continue the stream.
    #[must_use]
    pub fn decode(frame: &[u8]) -> PacketDecode {
        let Some(&header) = frame.first() else {
            return PacketDecode::Malformed;
        };
        let codec = header >> 5;
        let target = header & 0x1F;
        let mut rest = &frame[1..];

        let Some((source, n)) = varint::decode(rest) else {
            return PacketDecode::Malformed;
        };
        rest = &rest[n..];

        let Some((sequence, n)) = varint::decode(rest) else {
            return PacketDecode::Malformed;
        };
        rest = &rest[n..];

        if codec == CODEC_OPUS {
            let Some((field, n)) = varint::decode(rest) else {
                return PacketDecode::Malformed;
            };
            rest = &rest[n..];

            let len = (field & LENGTH_MASK) as usize;
            if len > rest.len() {
                return PacketDecode::Incomplete;
            }

            // Bytes past the declared length are ignored; the envelope
            // guarantees whole frames.
            PacketDecode::Packet(Self {
                codec,
                target,
                source: Some(source),
                sequence,
                payload: rest[..len].to_vec(),
                terminator: field & TERMINATOR_BIT != 0,
            })
        } else {
            PacketDecode::Packet(Self {
                codec,
                target,
                source: Some(source),
                sequence,
                payload: rest.to_vec(),
                terminator: false,
            })
        }
    }

    /// Build the wire bytes for this frame.
    ///
    /// The source varint is written only when `source` is `Some`; outbound
    /// client→server frames omit it. For the primary codec the payload must
    /// fit the 13-bit length field; the audio encoder's frames sit far below
    /// that ceiling.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        debug_assert!(
            self.codec != CODEC_OPUS || self.payload.len() <= LENGTH_MASK as usize,
            "primary codec payload exceeds the 13-bit length field"
        );

        let mut buf = Vec::with_capacity(16 + self.payload.len());
        buf.push((self.codec << 5) | (self.target & 0x1F));
        if let Some(source) = self.source {
            varint::encode(source, &mut buf);
        }
        varint::encode(self.sequence, &mut buf);

        if self.codec == CODEC_OPUS {
            let mut field = self.payload.len() as u32 & LENGTH_MASK;
            if self.terminator {
                field |= TERMINATOR_BIT;
            }
            varint::encode(field, &mut buf);
        }

        buf.extend_from_slice(&self.payload);
        buf
    }
}
