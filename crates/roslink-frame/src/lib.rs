//! Text and binary channel frames, with length-prefixed stream framing.
//!
//! The bridge session speaks over a frame-oriented duplex channel that
//! carries two kinds of frames: text (JSON control records) and binary
//! (topic and service data). [`Frame`] is that unit.
//!
//! When the channel is a plain byte stream, every frame is framed with:
//! - A 2-byte magic number ("RL") for stream synchronization
//! - A 1-byte frame kind and 1 reserved byte
//! - A 4-byte little-endian payload length
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod kind;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use kind::FrameKind;
pub use reader::FrameReader;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
