//! One client connection, from accept to close.
//!
//! Every accepted stream becomes its own [`ClientSession`] value, owned by
//! the accept loop for as long as the connection lives. Frames are pulled
//! from a [`Framed`] stream one at a time and each is answered before the
//! next is decoded.

use std::fmt;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::framing::{FrameEvent, LineCodec};
use crate::handler::MessageHandler;
use crate::protocol::Response;

/// Identifier attached to every log line of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// A fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a session ended without an I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed its side (zero-length read).
    PeerClosed,
    /// The service is shutting down.
    Shutdown,
}

/// The active client connection.
pub struct ClientSession<S> {
    id: ConnectionId,
    framed: Framed<S, LineCodec>,
}

impl<S> fmt::Debug for ClientSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("id", &self.id)
            .field("codec", self.framed.codec())
            .field("buffered", &self.framed.read_buffer().len())
            .finish_non_exhaustive()
    }
}

impl<S> ClientSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an accepted stream. `read_chunk` is the initial read buffer
    /// capacity.
    pub fn new(stream: S, read_chunk: usize, max_frame_bytes: usize) -> Self {
        let codec = LineCodec::new(max_frame_bytes);
        Self {
            id: ConnectionId::new(),
            framed: Framed::with_capacity(stream, codec, read_chunk.max(1)),
        }
    }

    /// This session's identifier.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Serve the connection until the peer closes, the service shuts down, or
    /// an I/O error occurs.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Connection`](crate::error::ServerError::Connection)
    /// when reading or writing fails. The error ends this session only.
    pub async fn run(
        &mut self,
        handler: &MessageHandler,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd> {
        loop {
            let next = tokio::select! {
                () = shutdown_signalled(shutdown) => return Ok(SessionEnd::Shutdown),
                next = self.framed.next() => next,
            };
            let line = match next {
                None => return Ok(SessionEnd::PeerClosed),
                Some(Err(e)) => return Err(e),
                Some(Ok(FrameEvent::Rejected(e))) => {
                    handler.record_rejection(&e);
                    warn!(error = %e, "Discarding frame");
                    continue;
                }
                Some(Ok(FrameEvent::Message(line))) => line,
            };
            debug!(bytes = line.len(), "Frame received");

            let replied = match handler.handle_line(&line).await {
                Ok(response) => self.send(&response).await,
                Err(e) => Err(e),
            };
            absorb(replied)?;
        }
    }

    /// Write one response line and flush it.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Connection`](crate::error::ServerError::Connection)
    /// if the write does not complete, or
    /// [`ServerError::Encode`](crate::error::ServerError::Encode) if the
    /// response cannot be serialized.
    pub async fn send(&mut self, response: &Response) -> Result<()> {
        self.framed.send(response).await?;
        debug!(kind = response.kind(), "Sent response");
        Ok(())
    }

    /// Shut down the write side of the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Connection`](crate::error::ServerError::Connection)
    /// if the shutdown fails.
    pub async fn close(&mut self) -> Result<()> {
        self.framed.get_mut().shutdown().await?;
        info!(connection = %self.id, "Connection closed");
        Ok(())
    }
}

/// Keep the session alive through message-local failures.
fn absorb(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.ends_session() => Err(e),
        Err(e) => {
            warn!(error = %e, class = ?e.class(), "Discarding message");
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

/// Resolve once `rx` holds `true` or its sender has gone away.
pub async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
