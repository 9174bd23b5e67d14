//! Little-endian CDR codec for ROS2 message payloads.
//!
//! This is the lowest layer of roslink. Every top-level payload is:
//! - A 4-byte encapsulation header (`00 01 00 00`, plain CDR little-endian)
//! - Field data, with each primitive aligned to its natural width
//!   measured from the start of the payload (header included)
//!
//! [`CdrWriter`] and [`CdrReader`] handle the header and padding so the
//! schema layer above only dispatches on field types.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{CdrError, Result};
pub use reader::CdrReader;
pub use writer::CdrWriter;

/// Size of the encapsulation header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Encapsulation header: representation `CDR_LE` (0x0001), options zero.
pub const ENCAPSULATION_HEADER: [u8; HEADER_SIZE] = [0x00, 0x01, 0x00, 0x00];
