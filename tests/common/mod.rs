//! Shared test utilities.

#![allow(dead_code)]

use std::io::Write;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use droopy::dashboard::Dashboard;
use droopy::elevator::Elevator;
use droopy::mux::{Message, Multiplexer, Origin, RunSummary};
use droopy::transport::{ControlServer, PeerRegistry};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

pub type SpyBuffer = Arc<Mutex<Vec<u8>>>;

/// Find an available port for testing.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to free port");
    listener.local_addr().unwrap().port()
}

/// Wait for a server to become available.
pub async fn wait_for_server(addr: SocketAddr, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Blocking variant for tests that drive the binary.
pub fn wait_for_port(port: u16, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if std::net::TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

/// Write a settings file into a fresh temp dir.
pub fn temp_settings(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, contents).expect("Failed to write config");
    (temp_dir, path)
}

/// Writer that records everything the dashboard prints.
pub struct SpyWriter(SpyBuffer);

impl SpyWriter {
    pub fn new(buf: SpyBuffer) -> Self {
        Self(buf)
    }
}

impl Write for SpyWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn spy_text(buf: &SpyBuffer) -> String {
    String::from_utf8_lossy(&buf.lock()).into_owned()
}

// -- In-process simulator -----------------------------------------------------

/// A simulator wired like the binary, except that ticks and stdin lines are
/// injected by the test through `tx`.
pub struct Simulator {
    pub addr: SocketAddr,
    pub peers: PeerRegistry,
    pub tx: UnboundedSender<Message>,
    pub output: SpyBuffer,
    pub run: JoinHandle<RunSummary>,
}

impl Simulator {
    pub async fn start() -> Self {
        let peers = PeerRegistry::new(Duration::from_millis(200));
        let server = ControlServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), peers.clone())
            .await
            .expect("Failed to bind control server");
        let addr = server.local_addr();

        let (tx, rx) = mpsc::unbounded_channel();
        server.spawn(tx.clone());

        let output: SpyBuffer = Arc::new(Mutex::new(Vec::new()));
        let dashboard = Dashboard::new(SpyWriter::new(output.clone()), false);
        let mux = Multiplexer::new(Elevator::new(), peers.clone(), dashboard);
        let run = tokio::spawn(async move { mux.run(rx).await.expect("dashboard write failed") });

        Self {
            addr,
            peers,
            tx,
            output,
            run,
        }
    }

    pub fn stdin(&self, payload: &str) {
        self.tx
            .send(Message::new(Origin::Stdin, payload))
            .expect("simulator stopped");
    }

    pub fn ticks(&self, count: usize) {
        for _ in 0..count {
            self.tx
                .send(Message::new(Origin::Ticker, "T"))
                .expect("simulator stopped");
        }
    }

    pub async fn wait_for_peers(&self, count: usize) {
        for _ in 0..400 {
            if self.peers.len().await == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {count} peers, have {}", self.peers.len().await);
    }

    /// Poll the dashboard until `needle` has been printed.
    pub async fn wait_for_output(&self, needle: &str) {
        for _ in 0..400 {
            if spy_text(&self.output).contains(needle) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("{needle:?} never printed: {}", spy_text(&self.output));
    }

    pub async fn quit(self) -> RunSummary {
        self.stdin("Q");
        self.run.await.expect("simulator task panicked")
    }
}

// -- Binary -------------------------------------------------------------------

/// The binary with tracing off and no user settings file in reach.
pub fn droopy_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_droopy"));
    cmd.env_remove("DEBUG")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", std::env::temp_dir().join("droopy-tests-no-config"));
    cmd
}

/// A simulator process that is killed on drop.
pub struct SimProcess {
    pub port: u16,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl SimProcess {
    pub fn spawn() -> Self {
        let port = free_port();
        let mut child = droopy_cmd()
            .arg("-addr")
            .arg(format!("127.0.0.1:{port}"))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to start droopy");
        let stdin = child.stdin.take();
        assert!(
            wait_for_port(port, Duration::from_secs(5)),
            "simulator did not start on port {port}"
        );

        Self {
            port,
            child,
            stdin,
        }
    }

    pub fn addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

impl Drop for SimProcess {
    fn drop(&mut self) {
        self.stdin.take();
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
