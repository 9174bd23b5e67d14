use roslink_frame::FrameError;

/// Errors raised by a [`Channel`](crate::Channel) when a frame cannot be sent.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The receiving half of the channel is gone.
    #[error("channel closed")]
    Closed,

    /// The underlying stream rejected the frame.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The frame could not be handed to the channel.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// The cancel signal fired before a response arrived.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// The session was closed while the operation was outstanding.
    #[error("session closed")]
    Closed,

    /// A control record could not be serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a binary data frame is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("empty data frame")]
    Empty,

    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("data frame too short for opcode 0x{opcode:02X} ({len} bytes, min {min})")]
    TooShort { opcode: u8, len: usize, min: usize },
}

pub type Result<T> = std::result::Result<T, SessionError>;
