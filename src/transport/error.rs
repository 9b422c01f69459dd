use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Failures that stop the control listener from starting.
///
/// Per-peer read and write failures are not errors at this level: the
/// peer is dropped and the simulator carries on.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("listening on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("reading listener address: {0}")]
    LocalAddr(#[source] io::Error),
}
