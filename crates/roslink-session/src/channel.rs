//! The outbound half of a bridge connection.
//!
//! A session only ever sends through [`Channel`]; whoever owns the
//! connection feeds received frames to `Session::handle_frame`.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use roslink_frame::{Frame, FrameConfig, FrameWriter};

use crate::error::ChannelError;

/// Frame sink for a session. Must preserve submission order.
pub trait Channel: Send + Sync {
    fn send(&self, frame: Frame) -> Result<(), ChannelError>;
}

impl<C: Channel + ?Sized> Channel for Arc<C> {
    fn send(&self, frame: Frame) -> Result<(), ChannelError> {
        (**self).send(frame)
    }
}

impl Channel for tokio::sync::mpsc::UnboundedSender<Frame> {
    fn send(&self, frame: Frame) -> Result<(), ChannelError> {
        tokio::sync::mpsc::UnboundedSender::send(self, frame).map_err(|_| ChannelError::Closed)
    }
}

impl Channel for std::sync::mpsc::Sender<Frame> {
    fn send(&self, frame: Frame) -> Result<(), ChannelError> {
        std::sync::mpsc::Sender::send(self, frame).map_err(|_| ChannelError::Closed)
    }
}

/// A channel over a byte stream, using the "RL" stream framing.
pub struct StreamChannel<W> {
    writer: Mutex<FrameWriter<W>>,
}

impl<W: Write + Send> StreamChannel<W> {
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: W, config: FrameConfig) -> Self {
        Self {
            writer: Mutex::new(FrameWriter::with_config(inner, config)),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_inner()
    }
}

impl<W: Write + Send> Channel for StreamChannel<W> {
    fn send(&self, frame: Frame) -> Result<(), ChannelError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.send(&frame)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use roslink_frame::{FrameError, FrameReader};

    use super::*;

    #[test]
    fn tokio_sender_reports_closed() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Frame>();
        Channel::send(&tx, Frame::text("a")).unwrap();
        drop(rx);
        assert!(matches!(
            Channel::send(&tx, Frame::text("b")),
            Err(ChannelError::Closed)
        ));
    }

    #[test]
    fn std_sender_preserves_order() {
        let (tx, rx) = std::sync::mpsc::channel::<Frame>();
        let channel: Arc<dyn Channel> = Arc::new(tx);
        channel.send(Frame::text("first")).unwrap();
        channel.send(Frame::binary(&b"second"[..])).unwrap();

        assert_eq!(rx.recv().unwrap(), Frame::text("first"));
        assert_eq!(rx.recv().unwrap(), Frame::binary(&b"second"[..]));
    }

    #[test]
    fn stream_channel_writes_framed_bytes() {
        let channel = StreamChannel::new(Cursor::new(Vec::<u8>::new()));
        channel.send(Frame::text(r#"{"op":"destroy","id":1}"#)).unwrap();
        channel.send(Frame::binary(&[0x01, 1, 0, 0, 0][..])).unwrap();

        let bytes = channel.into_inner().into_inner();
        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(
            reader.read_frame().unwrap(),
            Frame::text(r#"{"op":"destroy","id":1}"#)
        );
        assert_eq!(
            reader.read_frame().unwrap(),
            Frame::binary(&[0x01, 1, 0, 0, 0][..])
        );
    }

    #[test]
    fn stream_channel_surfaces_frame_errors() {
        let channel = StreamChannel::with_config(
            Cursor::new(Vec::<u8>::new()),
            FrameConfig {
                max_payload_size: 2,
            },
        );
        let err = channel.send(Frame::binary(&b"toolong"[..])).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::Frame(FrameError::PayloadTooLarge { .. })
        ));
    }
}
