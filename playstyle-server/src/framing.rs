//! Newline-delimited framing over a byte stream.
//!
//! [`LineCodec`] plugs into `tokio_util::codec::Framed`. The read buffer is
//! owned by the `Framed` wrapper; [`Decoder::decode`] either yields the next
//! frame or returns `Ok(None)` to ask for more bytes:
//!
//! ```text
//!            read(bytes)
//!   ┌──────────────┐     ┌───────────┐  '\n' found  ┌───────────────┐
//!   │ awaiting data │ ──▶ │ scanning  │ ───────────▶ │ message ready │
//!   └──────────────┘     └───────────┘              └───────────────┘
//!                             │ no '\n', over limit
//!                             ▼
//!                       ┌────────────┐  '\n' found
//!                       │ discarding │ ───────────▶ scanning
//!                       └────────────┘
//! ```
//!
//! Delimiter scanning and the bounded buffer come from [`LinesCodec`]. Its
//! per-line errors are turned into [`FrameEvent::Rejected`] so a bad frame
//! never terminates the stream.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};
use tracing::debug;

use crate::error::ServerError;
use crate::protocol::Response;

/// One decoded frame.
#[derive(Debug)]
pub enum FrameEvent {
    /// One complete, trimmed, non-empty message.
    Message(String),
    /// A frame that cannot be a message. The stream stays usable.
    Rejected(ServerError),
}

/// Line codec for the wire protocol: `'\n'`-terminated UTF-8 in, encoded
/// [`Response`] lines out.
#[derive(Debug)]
pub struct LineCodec {
    lines: LinesCodec,
    max_frame_bytes: usize,
}

impl LineCodec {
    /// Create a codec rejecting frames longer than `max_frame_bytes`.
    #[must_use]
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_frame_bytes),
            max_frame_bytes,
        }
    }

    /// Largest accepted frame.
    #[must_use]
    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }
}

impl Decoder for LineCodec {
    type Item = FrameEvent;
    type Error = ServerError;

    /// Whitespace-only frames are skipped silently.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<FrameEvent>, ServerError> {
        loop {
            match self.lines.decode(src) {
                Ok(None) => return Ok(None),
                Ok(Some(line)) => {
                    let text = line.trim();
                    if !text.is_empty() {
                        return Ok(Some(FrameEvent::Message(text.to_string())));
                    }
                }
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    return Ok(Some(FrameEvent::Rejected(ServerError::Oversized {
                        limit: self.max_frame_bytes,
                    })));
                }
                Err(LinesCodecError::Io(e)) => {
                    return Ok(Some(FrameEvent::Rejected(ServerError::Malformed(format!(
                        "invalid UTF-8: {e}"
                    )))));
                }
            }
        }
    }

    /// An unterminated frame at end of stream is dropped, not dispatched.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<FrameEvent>, ServerError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if !src.is_empty() {
            debug!(bytes = src.len(), "Dropping unterminated frame at end of stream");
            src.clear();
        }
        Ok(None)
    }
}

impl Encoder<&Response> for LineCodec {
    type Error = ServerError;

    fn encode(&mut self, item: &Response, dst: &mut BytesMut) -> Result<(), ServerError> {
        // Serialized up front so a failure leaves nothing half-written.
        let line = item.encode()?;
        dst.extend_from_slice(&line);
        Ok(())
    }
}
