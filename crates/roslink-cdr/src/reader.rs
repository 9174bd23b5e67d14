use crate::error::{CdrError, Result};
use crate::HEADER_SIZE;

/// Reads CDR-encoded values from a byte slice.
///
/// Offsets are measured from the start of the slice, which must begin
/// with the encapsulation header.
#[derive(Debug, Clone)]
pub struct CdrReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> CdrReader<'a> {
    /// Create a reader and consume the encapsulation header.
    ///
    /// The representation identifier is not checked; payloads are always
    /// decoded as little-endian.
    pub fn new(buf: &'a [u8]) -> Result<Self> {
        let mut reader = Self { buf, pos: 0 };
        reader.take(HEADER_SIZE)?;
        Ok(reader)
    }

    /// Skip padding until the read offset is a multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        if alignment <= 1 {
            return Ok(());
        }
        let remainder = self.pos % alignment;
        if remainder != 0 {
            self.take(alignment - remainder)?;
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if n > available {
            return Err(CdrError::UnexpectedEof {
                needed: n,
                offset: self.pos,
                available,
            });
        }
        let buf = self.buf;
        let start = self.pos;
        self.pos += n;
        Ok(&buf[start..self.pos])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.align(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a bool. Any non-zero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a `u8`.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read an `i8`.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a `u16`, aligned to 2 bytes.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.take_array().map(u16::from_le_bytes)
    }

    /// Read an `i16`, aligned to 2 bytes.
    pub fn read_i16(&mut self) -> Result<i16> {
        self.take_array().map(i16::from_le_bytes)
    }

    /// Read a `u32`, aligned to 4 bytes.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    /// Read an `i32`, aligned to 4 bytes.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    /// Read a `u64`, aligned to 8 bytes.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.take_array().map(u64::from_le_bytes)
    }

    /// Read an `i64`, aligned to 8 bytes.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.take_array().map(i64::from_le_bytes)
    }

    /// Read an IEEE-754 `f32`, aligned to 4 bytes.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.take_array().map(f32::from_le_bytes)
    }

    /// Read an IEEE-754 `f64`, aligned to 8 bytes.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.take_array().map(f64::from_le_bytes)
    }

    /// Read a string written as u32 count (terminator included) + bytes.
    ///
    /// The final byte is dropped as the terminator without being checked.
    /// A zero count reads as the empty string.
    pub fn read_string(&mut self) -> Result<String> {
        let count = self.read_u32()? as usize;
        if count == 0 {
            return Ok(String::new());
        }
        let offset = self.pos;
        let bytes = self.take(count)?;
        std::str::from_utf8(&bytes[..count - 1])
            .map(str::to_owned)
            .map_err(|_| CdrError::InvalidUtf8 { offset })
    }

    /// Read a sequence element count.
    pub fn read_sequence_len(&mut self) -> Result<usize> {
        Ok(self.read_u32()? as usize)
    }

    /// Consume the placeholder byte of a struct with no fields.
    pub fn read_empty_struct(&mut self) -> Result<()> {
        self.take(1).map(|_| ())
    }

    /// Current read offset from the start of the payload.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the current offset.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}
