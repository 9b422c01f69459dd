//! Live controller connections and event fan-out.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{oneshot, Mutex};

pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

type PeerWriter = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Peer {
    addr: SocketAddr,
    writer: PeerWriter,
    evicted: oneshot::Sender<()>,
}

/// Resolves once the registry has dropped the peer. The peer's reader
/// stops reading at that point.
pub struct Evicted(oneshot::Receiver<()>);

impl Evicted {
    /// Cancel safe.
    pub async fn wait(&mut self) {
        let _ = (&mut self.0).await;
    }
}

/// Shared registry of connected controllers.
///
/// Cloning is cheap and every clone sees the same peers. One mutex guards
/// the map and is held for the whole of a broadcast, so events reach every
/// peer in the order they were produced.
#[derive(Clone)]
pub struct PeerRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    peers: Mutex<HashMap<PeerId, Peer>>,
    next_id: AtomicU64,
    write_timeout: Duration,
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_WRITE_TIMEOUT)
    }
}

impl PeerRegistry {
    pub fn new(write_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                peers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                write_timeout,
            }),
        }
    }

    pub async fn add<W>(&self, addr: SocketAddr, writer: W) -> (PeerId, Evicted)
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let id = PeerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (evicted_tx, evicted_rx) = oneshot::channel();
        let peer = Peer {
            addr,
            writer: Box::new(writer),
            evicted: evicted_tx,
        };
        let count = {
            let mut peers = self.inner.peers.lock().await;
            peers.insert(id, peer);
            peers.len()
        };
        tracing::debug!(peer = %id, %addr, count, "controller connected");
        (id, Evicted(evicted_rx))
    }

    /// Drop a peer, close its write side and signal its [`Evicted`].
    /// Returns false if it was already gone, e.g. removed by a failed
    /// broadcast.
    pub async fn remove(&self, id: PeerId) -> bool {
        let peer = self.inner.peers.lock().await.remove(&id);
        match peer {
            Some(peer) => {
                self.close(id, peer).await;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.peers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.peers.lock().await.is_empty()
    }

    /// Whether any controller is connected.
    pub async fn is_connected(&self) -> bool {
        !self.is_empty().await
    }

    /// Write `msg` plus a newline to every peer.
    ///
    /// Peers whose write fails or exceeds the write timeout are removed.
    /// Returns the number of peers that received the line.
    pub async fn broadcast(&self, msg: &str) -> usize {
        let line = format!("{msg}\n");
        let timeout = self.inner.write_timeout;
        let mut peers = self.inner.peers.lock().await;

        let mut failed = Vec::new();
        for (id, peer) in peers.iter_mut() {
            let write = async {
                peer.writer.write_all(line.as_bytes()).await?;
                peer.writer.flush().await
            };
            match tokio::time::timeout(timeout, write).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::debug!(peer = %id, addr = %peer.addr, error = %err, "broadcast write failed");
                    failed.push(*id);
                }
                Err(_) => {
                    tracing::debug!(peer = %id, addr = %peer.addr, ?timeout, "broadcast write timed out");
                    failed.push(*id);
                }
            }
        }

        for id in &failed {
            if let Some(peer) = peers.remove(id) {
                self.close(*id, peer).await;
            }
        }

        peers.len()
    }

    async fn close(&self, id: PeerId, mut peer: Peer) {
        let _ = peer.evicted.send(());
        // A stuck peer must not hold up the caller past the write timeout.
        let _ = tokio::time::timeout(self.inner.write_timeout, peer.writer.shutdown()).await;
        tracing::debug!(peer = %id, addr = %peer.addr, "controller disconnected");
    }
}
