//! Voice wire protocol
//!
//! The transport carries audio inside a tunneled-audio envelope on its
//! control connection: a 2-byte big-endian type tag, a 4-byte big-endian
//! payload length, then the audio frame described in [`packet`].

pub mod packet;
pub mod varint;

pub use packet::{AudioPacket, PacketDecode, CODEC_OPUS, TARGET_LOOPBACK, TARGET_NORMAL};

use bytes::{Buf, BufMut};

/// Envelope type tag for tunneled audio
pub const TUNNEL_AUDIO: u16 = 1;

/// Envelope header size: type tag + payload length
pub const ENVELOPE_HEADER_LEN: usize = 6;

/// Wrap an audio frame in the tunneled-audio envelope.
#[must_use]
pub fn wrap_tunnel(frame: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ENVELOPE_HEADER_LEN + frame.len());
    buf.put_u16(TUNNEL_AUDIO);
    buf.put_u32(frame.len() as u32);
    buf.extend_from_slice(frame);
    buf
}

/// Unwrap a tunneled-audio envelope, returning the inner audio frame.
///
/// Returns `None` for short buffers, non-audio type tags, and length fields
/// that disagree with the buffer.
#[must_use]
pub fn unwrap_tunnel(envelope: &[u8]) -> Option<&[u8]> {
    if envelope.len() < ENVELOPE_HEADER_LEN {
        return None;
    }
    let mut header = &envelope[..ENVELOPE_HEADER_LEN];
    if header.get_u16() != TUNNEL_AUDIO {
        return None;
    }
    let len = header.get_u32() as usize;
    let body = &envelope[ENVELOPE_HEADER_LEN..];
    (body.len() == len).then_some(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_roundtrip() {
        let frame = vec![1u8, 2, 3, 4, 5];
        let enveloped = wrap_tunnel(&frame);
        assert_eq!(enveloped.len(), ENVELOPE_HEADER_LEN + frame.len());
        assert_eq!(unwrap_tunnel(&enveloped), Some(frame.as_slice()));
    }

    #[test]
    fn wrong_tag_is_rejected() {
        let mut enveloped = wrap_tunnel(&[1, 2, 3]);
        enveloped[1] = 9;
        assert_eq!(unwrap_tunnel(&enveloped), None);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let mut enveloped = wrap_tunnel(&[1, 2, 3]);
        enveloped.pop();
        assert_eq!(unwrap_tunnel(&enveloped), None);
        assert_eq!(unwrap_tunnel(&[0, 1]), None);
    }
}
