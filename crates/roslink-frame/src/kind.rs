//! Frame kinds.
//!
//! Text frames carry JSON control records; binary frames carry
//! opcode-tagged topic and service data.

use crate::error::FrameError;

/// Wire value of a text frame.
pub const TEXT: u8 = 0x01;

/// Wire value of a binary frame.
pub const BINARY: u8 = 0x02;

/// The two kinds of frame a bridge channel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Text,
    Binary,
}

impl FrameKind {
    /// Wire byte for this kind.
    pub fn as_u8(self) -> u8 {
        match self {
            FrameKind::Text => TEXT,
            FrameKind::Binary => BINARY,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            FrameKind::Text => "TEXT",
            FrameKind::Binary => "BINARY",
        }
    }
}

impl TryFrom<u8> for FrameKind {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            TEXT => Ok(FrameKind::Text),
            BINARY => Ok(FrameKind::Binary),
            other => Err(FrameError::UnknownKind(other)),
        }
    }
}
