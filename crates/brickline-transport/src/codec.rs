use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{Result, TransportError};

/// Stream links prefix every inbound reply with its length.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Default maximum inbound frame size: the largest value the prefix can carry.
pub const DEFAULT_MAX_FRAME: usize = u16::MAX as usize;

/// Split one length-prefixed reply off the front of `src`.
///
/// Wire format on stream links (TCP, Bluetooth SPP):
/// ```text
/// ┌─────────────┬──────────────────────────────┐
/// │ Length (2B) │ Frame (Length bytes)          │
/// │ LE          │ sequence, reply kind, payload │
/// └─────────────┴──────────────────────────────┘
/// ```
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the prefix and frame bytes and returns the frame
/// without its prefix.
pub fn decode_reply(src: &mut BytesMut, max_frame: usize) -> Result<Option<Bytes>> {
    if src.len() < LENGTH_PREFIX_SIZE {
        return Ok(None);
    }

    let len = u16::from_le_bytes([src[0], src[1]]) as usize;
    if len > max_frame {
        return Err(TransportError::FrameTooLarge {
            size: len,
            max: max_frame,
        });
    }

    if src.len() < LENGTH_PREFIX_SIZE + len {
        src.reserve(LENGTH_PREFIX_SIZE + len - src.len());
        return Ok(None);
    }

    src.advance(LENGTH_PREFIX_SIZE);
    Ok(Some(src.split_to(len).freeze()))
}

/// tokio-util codec for stream links to a brick.
///
/// Outbound command frames already embed their own length field, so encoding
/// is a pass-through. Inbound replies are split on their length prefix.
#[derive(Debug, Clone)]
pub struct BrickCodec {
    max_frame: usize,
}

impl BrickCodec {
    /// Create a codec with the default frame limit.
    pub fn new() -> Self {
        Self::with_max_frame(DEFAULT_MAX_FRAME)
    }

    /// Create a codec that rejects inbound frames larger than `max_frame`.
    pub fn with_max_frame(max_frame: usize) -> Self {
        Self { max_frame }
    }

    /// Current inbound frame limit.
    pub fn max_frame(&self) -> usize {
        self.max_frame
    }
}

impl Default for BrickCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BrickCodec {
    type Item = Bytes;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        decode_reply(src, self.max_frame)
    }
}

impl Encoder<Bytes> for BrickCodec {
    type Error = TransportError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixed(frame: &[u8]) -> Vec<u8> {
        let mut out = (frame.len() as u16).to_le_bytes().to_vec();
        out.extend_from_slice(frame);
        out
    }

    #[test]
    fn decode_single_reply() {
        let mut buf = BytesMut::from(&prefixed(&[0x01, 0x00, 0x02, 0xAA])[..]);
        let frame = decode_reply(&mut buf, DEFAULT_MAX_FRAME).unwrap().unwrap();
        assert_eq!(frame.as_ref(), &[0x01, 0x00, 0x02, 0xAA]);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_incomplete_prefix() {
        let mut buf = BytesMut::from(&[0x05][..]);
        assert!(decode_reply(&mut buf, DEFAULT_MAX_FRAME).unwrap().is_none());
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn decode_incomplete_frame() {
        let mut wire = prefixed(b"hello");
        wire.truncate(4);
        let mut buf = BytesMut::from(&wire[..]);
        assert!(decode_reply(&mut buf, DEFAULT_MAX_FRAME).unwrap().is_none());
        assert_eq!(buf.len(), 4, "partial frame must stay buffered");
    }

    #[test]
    fn decode_back_to_back_replies() {
        let mut wire = prefixed(&[0x01, 0x00, 0x02]);
        wire.extend(prefixed(&[0x02, 0x00, 0x03, 0x92, 0x00, 0x07]));
        let mut buf = BytesMut::from(&wire[..]);

        let first = decode_reply(&mut buf, DEFAULT_MAX_FRAME).unwrap().unwrap();
        let second = decode_reply(&mut buf, DEFAULT_MAX_FRAME).unwrap().unwrap();

        assert_eq!(first.as_ref(), &[0x01, 0x00, 0x02]);
        assert_eq!(second.as_ref(), &[0x02, 0x00, 0x03, 0x92, 0x00, 0x07]);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_rejects_oversized_announcement() {
        let mut buf = BytesMut::from(&[0x00, 0x04][..]);
        let err = decode_reply(&mut buf, 64).unwrap_err();
        assert!(matches!(
            err,
            TransportError::FrameTooLarge {
                size: 1024,
                max: 64
            }
        ));
    }

    #[test]
    fn encoder_passes_command_through() {
        let mut codec = BrickCodec::new();
        let mut dst = BytesMut::new();
        codec
            .encode(Bytes::from_static(&[0x05, 0x00, 0x01, 0x00, 0x80]), &mut dst)
            .unwrap();
        assert_eq!(dst.as_ref(), &[0x05, 0x00, 0x01, 0x00, 0x80]);
    }
}
