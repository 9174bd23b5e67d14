use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::kind::FrameKind;

/// Frame header: magic (2) + kind (1) + reserved (1) + length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Magic bytes: "RL" (0x52 0x4C).
pub const MAGIC: [u8; 2] = [0x52, 0x4C];

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// One frame of the bridge channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A UTF-8 control record.
    Text(String),
    /// An opcode-tagged data frame.
    Binary(Bytes),
}

impl Frame {
    /// Create a text frame.
    pub fn text(payload: impl Into<String>) -> Self {
        Frame::Text(payload.into())
    }

    /// Create a binary frame.
    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Frame::Binary(payload.into())
    }

    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Text(_) => FrameKind::Text,
            Frame::Binary(_) => FrameKind::Binary,
        }
    }

    /// The raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        match self {
            Frame::Text(text) => text.as_bytes(),
            Frame::Binary(bytes) => bytes.as_ref(),
        }
    }

    /// The total stream wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload().len()
    }
}

/// Encode a frame into the stream wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬────────┬──────────┬───────────┬─────────────────┐
/// │ Magic (2B)   │ Kind   │ Reserved │ Length    │ Payload         │
/// │ 0x52 0x4C    │ (1B)   │ (1B, 0)  │ (4B LE)   │ (Length bytes)  │
/// │ "RL"         │        │          │           │                 │
/// └──────────────┴────────┴──────────┴───────────┴─────────────────┘
/// ```
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    let payload = frame.payload();
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u8(frame.kind().as_u8());
    dst.put_u8(0);
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. A text frame with
/// invalid UTF-8 is consumed before `InvalidText` is returned, so the
/// stream stays in sync.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    // Check magic
    if src[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let kind = FrameKind::try_from(src[2])?;
    let payload_len = u32::from_le_bytes([src[4], src[5], src[6], src[7]]) as usize;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    match kind {
        FrameKind::Binary => Ok(Some(Frame::Binary(payload))),
        FrameKind::Text => String::from_utf8(payload.to_vec())
            .map(|text| Some(Frame::Text(text)))
            .map_err(|_| FrameError::InvalidText),
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
