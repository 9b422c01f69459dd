//! TCP control channel.
//!
//! Every accepted connection is registered for event broadcasts and read
//! line by line; each non-empty line becomes a `ctrl` message for the
//! multiplexer.

mod error;
mod registry;

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::mux::{LineReader, Message, Origin};

pub use error::TransportError;
pub use registry::{Evicted, PeerId, PeerRegistry, DEFAULT_WRITE_TIMEOUT};

pub struct ControlServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    peers: PeerRegistry,
}

impl ControlServer {
    pub async fn bind(addr: SocketAddr, peers: PeerRegistry) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(TransportError::LocalAddr)?;
        tracing::debug!(%local_addr, "control listener bound");

        Ok(Self {
            listener,
            local_addr,
            peers,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peers(&self) -> PeerRegistry {
        self.peers.clone()
    }

    /// Run the accept loop in the background.
    ///
    /// The listener and every peer connection are closed once the
    /// multiplexer has dropped its receiver.
    pub fn spawn(self, tx: UnboundedSender<Message>) -> JoinHandle<()> {
        tokio::spawn(self.accept_loop(tx))
    }

    async fn accept_loop(self, tx: UnboundedSender<Message>) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let _ = stream.set_nodelay(true);
                        let (reader, writer) = stream.into_split();
                        tokio::spawn(serve_peer(reader, writer, addr, self.peers.clone(), tx.clone()));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "accept failed");
                    }
                },
                _ = tx.closed() => break,
            }
        }
    }
}

/// Register the peer for broadcasts and forward its lines until it hangs
/// up, the registry evicts it, or the multiplexer is gone.
async fn serve_peer<R, W>(
    reader: R,
    writer: W,
    addr: SocketAddr,
    peers: PeerRegistry,
    tx: UnboundedSender<Message>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let (id, mut evicted) = peers.add(addr, writer).await;

    let mut lines = LineReader::new(reader);
    loop {
        let next = tokio::select! {
            next = lines.next_line() => next,
            _ = evicted.wait() => {
                tracing::debug!(peer = %id, %addr, "controller evicted, reader stopped");
                return;
            }
            _ = tx.closed() => break,
        };
        match next {
            Ok(Some(line)) => {
                if line.is_empty() {
                    continue;
                }
                if tx.send(Message::new(Origin::Ctrl, line)).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(peer = %id, %addr, error = %err, "controller read failed");
                break;
            }
        }
    }

    peers.remove(id).await;
}
