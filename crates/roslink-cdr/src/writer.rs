use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CdrError, Result};
use crate::ENCAPSULATION_HEADER;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Writes CDR-encoded values into a growable buffer.
///
/// The encapsulation header is emitted on construction, so alignment is
/// always computed relative to the start of the payload.
#[derive(Debug)]
pub struct CdrWriter {
    buf: BytesMut,
}

impl CdrWriter {
    /// Create a writer and emit the encapsulation header.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_BUFFER_CAPACITY)
    }

    /// Create a writer with pre-allocated capacity and emit the header.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buf = BytesMut::with_capacity(capacity.max(ENCAPSULATION_HEADER.len()));
        buf.put_slice(&ENCAPSULATION_HEADER);
        Self { buf }
    }

    /// Pad with zeros until the write offset is a multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) {
        if alignment <= 1 {
            return;
        }
        let remainder = self.buf.len() % alignment;
        if remainder != 0 {
            self.buf.put_bytes(0, alignment - remainder);
        }
    }

    /// Write a bool as a single 0 or 1 byte.
    pub fn write_bool(&mut self, v: bool) {
        self.buf.put_u8(u8::from(v));
    }

    /// Write a `u8`.
    pub fn write_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    /// Write an `i8`.
    pub fn write_i8(&mut self, v: i8) {
        self.buf.put_i8(v);
    }

    /// Write a `u16`, aligned to 2 bytes.
    pub fn write_u16(&mut self, v: u16) {
        self.align(2);
        self.buf.put_u16_le(v);
    }

    /// Write an `i16`, aligned to 2 bytes.
    pub fn write_i16(&mut self, v: i16) {
        self.align(2);
        self.buf.put_i16_le(v);
    }

    /// Write a `u32`, aligned to 4 bytes.
    pub fn write_u32(&mut self, v: u32) {
        self.align(4);
        self.buf.put_u32_le(v);
    }

    /// Write an `i32`, aligned to 4 bytes.
    pub fn write_i32(&mut self, v: i32) {
        self.align(4);
        self.buf.put_i32_le(v);
    }

    /// Write a `u64`, aligned to 8 bytes.
    pub fn write_u64(&mut self, v: u64) {
        self.align(8);
        self.buf.put_u64_le(v);
    }

    /// Write an `i64`, aligned to 8 bytes.
    pub fn write_i64(&mut self, v: i64) {
        self.align(8);
        self.buf.put_i64_le(v);
    }

    /// Write an IEEE-754 `f32`, aligned to 4 bytes.
    pub fn write_f32(&mut self, v: f32) {
        self.align(4);
        self.buf.put_f32_le(v);
    }

    /// Write an IEEE-754 `f64`, aligned to 8 bytes.
    pub fn write_f64(&mut self, v: f64) {
        self.align(8);
        self.buf.put_f64_le(v);
    }

    /// Write a string: u32 byte count including the NUL terminator, the
    /// UTF-8 bytes, then the terminator.
    pub fn write_string(&mut self, v: &str) -> Result<()> {
        let len = v.len() + 1;
        let prefix = u32::try_from(len).map_err(|_| CdrError::LengthOverflow(len))?;
        self.write_u32(prefix);
        self.buf.reserve(len);
        self.buf.put_slice(v.as_bytes());
        self.buf.put_u8(0);
        Ok(())
    }

    /// Write a sequence element count.
    pub fn write_sequence_len(&mut self, len: usize) -> Result<()> {
        let count = u32::try_from(len).map_err(|_| CdrError::LengthOverflow(len))?;
        self.write_u32(count);
        Ok(())
    }

    /// Write the single placeholder byte that stands in for a struct with
    /// no fields.
    pub fn write_empty_struct(&mut self) {
        self.buf.put_u8(0);
    }

    /// Current write offset from the start of the payload.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Finish encoding and return the payload.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for CdrWriter {
    fn default() -> Self {
        Self::new()
    }
}
