//! The listening service: port selection, the accept loop and shutdown.
//!
//! ```text
//! bind window ──▶ publish port file ──▶ accept ──▶ session ──┐
//!                                         ▲                   │
//!                                         └───── ended ◀──────┘
//! shutdown: close session ▸ close listener ▸ remove port file
//! ```
//!
//! Exactly one session is served at a time: the next `accept` is not polled
//! until the current session has returned.

use std::net::SocketAddr;
use std::sync::Arc;

use playstyle_core::Analyzer;
use playstyle_core::config::ServerConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{Instrument, error, info, info_span, warn};

use crate::error::{Result, ServerError};
use crate::handler::MessageHandler;
use crate::metrics::{CounterSnapshot, ServiceCounters};
use crate::port::{self, PortFile};
use crate::session::{self, ClientSession, SessionEnd};

/// A bound, published, not yet running service.
#[derive(Debug)]
pub struct Service {
    listener: TcpListener,
    local_addr: SocketAddr,
    port_file: PortFile,
    handler: MessageHandler,
    read_chunk_bytes: usize,
    max_frame_bytes: usize,
}

impl Service {
    /// Bind the first free port in the configured window and publish it.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a startup-class error if no port binds, the listener cannot be
    /// registered, or the port file cannot be written.
    pub fn bind(config: &ServerConfig, analyzer: Arc<dyn Analyzer>) -> Result<Self> {
        let std_listener =
            port::bind_first_available(&config.host, config.start_port, config.port_scan_width)?;
        std_listener
            .set_nonblocking(true)
            .map_err(ServerError::Listener)?;
        let listener = TcpListener::from_std(std_listener).map_err(ServerError::Listener)?;
        let local_addr = listener.local_addr().map_err(ServerError::Listener)?;

        let port_file = PortFile::publish(&config.port_file, local_addr.port())?;

        Ok(Self {
            listener,
            local_addr,
            port_file,
            handler: MessageHandler::new(analyzer, Arc::new(ServiceCounters::new())),
            read_chunk_bytes: config.read_chunk_bytes,
            max_frame_bytes: config.max_frame_bytes,
        })
    }

    /// The port actually bound.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// The address actually bound.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept and serve connections one at a time until `shutdown` fires.
    ///
    /// Returns the final counter values after the listener is closed and the
    /// port file removed.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> CounterSnapshot {
        let Self {
            listener,
            local_addr,
            port_file,
            handler,
            read_chunk_bytes,
            max_frame_bytes,
        } = self;
        info!(addr = %local_addr, "Playstyle service listening");

        let mut active: Option<ClientSession<TcpStream>> = None;
        loop {
            let accepted = tokio::select! {
                () = session::shutdown_signalled(&mut shutdown) => None,
                accepted = listener.accept() => Some(accepted),
            };
            let (stream, peer) = match accepted {
                None => break,
                Some(Ok(conn)) => conn,
                Some(Err(e)) => {
                    error!(error = %e, "Failed to accept connection");
                    continue;
                }
            };

            ServiceCounters::bump(&handler.counters().connections_accepted);
            let session = active.insert(ClientSession::new(
                stream,
                read_chunk_bytes,
                max_frame_bytes,
            ));
            let span = info_span!("session", connection = %session.id(), %peer);
            let outcome = async {
                info!("Client connected");
                let outcome = session.run(&handler, &mut shutdown).await;
                match &outcome {
                    Ok(SessionEnd::PeerClosed) => info!("Client disconnected"),
                    Ok(SessionEnd::Shutdown) => info!("Session interrupted by shutdown"),
                    Err(e) => warn!(error = %e, class = ?e.class(), "Session ended by error"),
                }
                outcome
            }
            .instrument(span)
            .await;
            handler.counters().snapshot().log("Session summary");

            if matches!(outcome, Ok(SessionEnd::Shutdown)) {
                break;
            }
            active = None;
        }

        shutdown_steps(active, listener, port_file).await;
        let snapshot = handler.counters().snapshot();
        snapshot.log("Playstyle service stopped");
        snapshot
    }
}

/// Close the session, the listener and the port file. Each step runs
/// regardless of how the previous one went.
async fn shutdown_steps<S>(
    active: Option<ClientSession<S>>,
    listener: TcpListener,
    port_file: PortFile,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Some(mut session) = active {
        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close active connection");
        }
    }
    drop(listener);
    info!("Listener closed");
    if let Err(e) = port_file.remove() {
        warn!(error = %e, "Port file left behind");
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    /// A stream whose write side refuses to shut down.
    struct StuckShutdown;

    impl AsyncRead for StuckShutdown {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for StuckShutdown {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::NotConnected, "already gone")))
        }
    }

    #[tokio::test]
    async fn failed_session_close_still_releases_listener_and_port_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let port_file = PortFile::publish(dir.path().join("ai_port.txt"), 1).expect("publish");
        let path = port_file.path().to_path_buf();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let mut session = ClientSession::new(StuckShutdown, 16, 64);
        assert!(session.close().await.is_err());

        shutdown_steps(Some(session), listener, port_file).await;

        assert!(!path.exists(), "port file removed after failed close");
        let rebound = TcpListener::bind(addr).await;
        assert!(rebound.is_ok(), "listener released after failed close");
    }
}
