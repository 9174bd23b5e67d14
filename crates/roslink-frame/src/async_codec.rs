//! `tokio_util` codec over the same stream framing as [`FrameReader`](crate::FrameReader).

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame, FrameConfig};
use crate::error::FrameError;

/// Frame codec for `FramedRead` / `FramedWrite` / `Framed`.
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    config: FrameConfig,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    /// Text frames that are not UTF-8 are skipped so the stream keeps
    /// going. Every other framing error ends it.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        loop {
            match decode_frame(src, self.config.max_payload_size) {
                Err(FrameError::InvalidText) => {
                    tracing::debug!("skipping text frame with invalid UTF-8");
                }
                other => return other,
            }
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        let len = frame.payload().len();
        if len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: len,
                max: self.config.max_payload_size,
            });
        }
        encode_frame(&frame, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (client, server) = tokio::io::duplex(64);
        let mut sink = FramedWrite::new(client, FrameCodec::new());
        let mut stream = FramedRead::new(server, FrameCodec::new());

        let writer = tokio::spawn(async move {
            sink.send(Frame::text(r#"{"id":4,"call_id":1}"#))
                .await
                .unwrap();
            sink.send(Frame::binary(vec![0x01, 4, 0, 0, 0, 1, 2, 3]))
                .await
                .unwrap();
        });

        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        writer.await.unwrap();

        assert_eq!(first, Frame::text(r#"{"id":4,"call_id":1}"#));
        assert_eq!(second.payload(), &[0x01, 4, 0, 0, 0, 1, 2, 3]);
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn encoder_enforces_max_payload() {
        let mut codec = FrameCodec::with_config(FrameConfig {
            max_payload_size: 2,
        });
        let mut dst = BytesMut::new();
        let err = codec
            .encode(Frame::binary(vec![0u8; 3]), &mut dst)
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 3, max: 2 }));
        assert!(dst.is_empty());
    }

    #[tokio::test]
    async fn invalid_text_frame_is_skipped() {
        let mut wire = BytesMut::new();
        wire.extend_from_slice(&[b'R', b'L', 0x01, 0x00, 2, 0, 0, 0, 0xFF, 0xFE]);
        encode_frame(&Frame::text("after"), &mut wire).unwrap();

        let mut stream = FramedRead::new(&wire[..], FrameCodec::new());
        assert_eq!(stream.next().await.unwrap().unwrap(), Frame::text("after"));
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn decoder_waits_for_complete_frame() {
        let mut codec = FrameCodec::new();
        let mut full = BytesMut::new();
        encode_frame(&Frame::text("partial"), &mut full).unwrap();

        let mut src = BytesMut::from(&full[..full.len() - 1]);
        assert!(codec.decode(&mut src).unwrap().is_none());

        src.extend_from_slice(&full[full.len() - 1..]);
        assert_eq!(codec.decode(&mut src).unwrap(), Some(Frame::text("partial")));
    }
}
