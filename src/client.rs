//! Controller-side connection to a running simulator.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connecting to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("connection closed")]
    Closed,
}

/// Sends commands and receives event lines over one TCP connection.
pub struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    /// Connect to `addr`. An empty host (`:10000`) means the local machine.
    pub async fn connect(addr: &str) -> Result<Self, ClientError> {
        let target = if addr.starts_with(':') {
            format!("127.0.0.1{addr}")
        } else {
            addr.to_string()
        };

        let stream = TcpStream::connect(&target)
            .await
            .map_err(|source| ClientError::Connect { addr: target.clone(), source })?;
        let _ = stream.set_nodelay(true);
        let (reader, writer) = stream.into_split();

        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    pub async fn send(&mut self, cmd: &str) -> Result<(), ClientError> {
        self.writer.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Wait for the next event line.
    pub async fn recv(&mut self) -> Result<String, ClientError> {
        self.lines.next_line().await?.ok_or(ClientError::Closed)
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn send_and_recv_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"A2\r\nS2\n").await.unwrap();
            let mut received = String::new();
            stream.read_to_string(&mut received).await.unwrap();
            received
        });

        let mut client = Client::connect(&format!(":{}", addr.port())).await.unwrap();
        client.send("MU").await.unwrap();
        client.send("S").await.unwrap();
        assert_eq!(client.recv().await.unwrap(), "A2");
        assert_eq!(client.recv().await.unwrap(), "S2");
        client.close().await.unwrap();

        assert_eq!(server.await.unwrap(), "MU\nS\n");
    }

    #[tokio::test]
    async fn recv_after_server_hangup_is_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut client = Client::connect(&addr.to_string()).await.unwrap();
        let err = client.recv().await.unwrap_err();
        assert!(matches!(err, ClientError::Closed));
        assert_eq!(err.to_string(), "connection closed");
    }

    #[tokio::test]
    async fn connect_failure_names_the_address() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = Client::connect(&addr.to_string()).await.err().unwrap();
        assert!(err.to_string().starts_with(&format!("connecting to {addr}")), "{err}");
    }
}
