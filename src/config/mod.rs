//! Settings file and listener address handling.

mod loader;
mod types;

use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::num::ParseIntError;

use thiserror::Error;

pub use loader::ConfigError;
pub use types::{Settings, SimulatorSettings, DEFAULT_ADDR};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddrError {
    #[error("missing ':'")]
    MissingColon,

    #[error("bad port - {0}")]
    BadPort(#[source] ParseIntError),

    #[error("bad port number")]
    PortOutOfRange,
}

/// A validated `host:port` pair. The host is not resolved until bind time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindAddr {
    host: String,
    port: u16,
}

impl BindAddr {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve to a socket address. An empty host means all interfaces.
    pub fn resolve(&self) -> io::Result<SocketAddr> {
        if self.host.is_empty() {
            return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port));
        }

        let host = self
            .host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host);

        (host, self.port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {:?}", self.host),
            )
        })
    }
}

impl fmt::Display for BindAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Check a listener address of the form `host:port`.
///
/// The port is everything after the last `:` and must be an integer in
/// `0..=65535`.
pub fn validate_addr(addr: &str) -> Result<BindAddr, AddrError> {
    let (host, port) = addr.rsplit_once(':').ok_or(AddrError::MissingColon)?;
    let port: i64 = port.parse().map_err(AddrError::BadPort)?;
    let port = u16::try_from(port).map_err(|_| AddrError::PortOutOfRange)?;

    Ok(BindAddr {
        host: host.to_string(),
        port,
    })
}
