use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally, so callers always get whole frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with custom configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    /// `InvalidText` leaves the reader usable: the bad frame has already
    /// been consumed.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, self.config.max_payload_size)? {
                tracing::trace!(
                    kind = frame.kind().name(),
                    len = frame.payload().len(),
                    "frame read"
                );
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the underlying stream.
    ///
    /// Bytes already buffered but not yet decoded are discarded.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// The active frame configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Frame>;

    /// Yields frames until the stream closes cleanly.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_frame() {
            Err(FrameError::ConnectionClosed) if self.buf.is_empty() => None,
            other => Some(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::{encode_frame, MAGIC};
    use crate::kind::{BINARY, TEXT};

    fn wire(frames: &[Frame]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for frame in frames {
            encode_frame(frame, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[Frame::text("hello")])));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame, Frame::text("hello"));
    }

    #[test]
    fn read_mixed_frames() {
        let bytes = wire(&[
            Frame::text(r#"{"id":1,"call_id":0}"#),
            Frame::binary(&[0x01, 1, 0, 0, 0, 0xAA][..]),
            Frame::text("tail"),
        ]);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!(f1, Frame::text(r#"{"id":1,"call_id":0}"#));
        assert_eq!(f2.payload(), &[0x01, 1, 0, 0, 0, 0xAA]);
        assert_eq!(f3, Frame::text("tail"));
    }

    #[test]
    fn read_frame_with_large_payload() {
        let payload = vec![0xAB; 64 * 1024];
        let mut reader = FrameReader::new(Cursor::new(wire(&[Frame::binary(payload.clone())])));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.payload(), payload.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire(&[Frame::binary(&b"slow"[..])]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.payload(), b"slow");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut partial = BytesMut::new();
        partial.put_slice(&MAGIC);
        partial.put_u8(BINARY);
        partial.put_u8(0);
        partial.put_u32_le(16);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn invalid_magic_in_stream() {
        let bytes = vec![0x00, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::InvalidMagic));
    }

    #[test]
    fn oversized_frame_in_stream() {
        let mut bytes = BytesMut::new();
        bytes.put_slice(&MAGIC);
        bytes.put_u8(BINARY);
        bytes.put_u8(0);
        bytes.put_u32_le(1024);

        let cfg = FrameConfig {
            max_payload_size: 16,
        };
        let mut reader = FrameReader::with_config(Cursor::new(bytes.to_vec()), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn invalid_text_then_next_frame() {
        let mut bytes = BytesMut::new();
        bytes.put_slice(&MAGIC);
        bytes.put_u8(TEXT);
        bytes.put_u8(0);
        bytes.put_u32_le(1);
        bytes.put_u8(0xC0);
        encode_frame(&Frame::text("ok"), &mut bytes).unwrap();

        let mut reader = FrameReader::new(Cursor::new(bytes.to_vec()));
        assert!(matches!(reader.read_frame(), Err(FrameError::InvalidText)));
        assert_eq!(reader.read_frame().unwrap(), Frame::text("ok"));
    }

    #[test]
    fn iterator_stops_at_clean_eof() {
        let reader = FrameReader::new(Cursor::new(wire(&[
            Frame::text("a"),
            Frame::binary(&b"b"[..]),
        ])));
        let frames: Vec<Frame> = reader.map(|f| f.unwrap()).collect();
        assert_eq!(frames, vec![Frame::text("a"), Frame::binary(&b"b"[..])]);
    }

    #[test]
    fn iterator_reports_truncated_tail() {
        let mut bytes = wire(&[Frame::text("a")]);
        bytes.extend_from_slice(&[0x52, 0x4C, BINARY]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next(),
            Some(Err(FrameError::ConnectionClosed))
        ));
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.send_text("ping").unwrap();
        writer.send_binary(&[0x03, 7, 0, 0, 0]).unwrap();

        assert_eq!(reader.read_frame().unwrap(), Frame::text("ping"));
        assert_eq!(
            reader.read_frame().unwrap(),
            Frame::binary(&[0x03, 7, 0, 0, 0][..])
        );
    }

    #[test]
    #[cfg(unix)]
    fn concurrent_reader_writer_threads() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        let reader_thread = std::thread::spawn(move || {
            for expected in 0..64u32 {
                let frame = reader.read_frame().unwrap();
                if expected % 2 == 0 {
                    assert_eq!(frame, Frame::text(format!("msg-{expected}")));
                } else {
                    assert_eq!(frame.payload(), expected.to_le_bytes());
                }
            }
        });

        for i in 0..64u32 {
            if i % 2 == 0 {
                writer.send_text(&format!("msg-{i}")).unwrap();
            } else {
                writer.send_binary(&i.to_le_bytes()).unwrap();
            }
        }

        reader_thread.join().unwrap();
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            bytes: wire(&[Frame::text("ok")]),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        assert_eq!(framed.read_frame().unwrap(), Frame::text("ok"));
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}
