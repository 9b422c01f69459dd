//! Event fan-out to TCP controllers through a running multiplexer.

mod common;

use std::time::Duration;

use common::{spy_text, Simulator};
use droopy::client::{Client, ClientError};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn recv(client: &mut Client) -> String {
    timeout(RECV_TIMEOUT, client.recv())
        .await
        .expect("timed out waiting for event")
        .expect("connection failed")
}

async fn connect(sim: &Simulator) -> Client {
    Client::connect(&sim.addr.to_string())
        .await
        .expect("Failed to connect")
}

/// Two observers both receive the approach event exactly once.
#[tokio::test]
async fn test_multi_observer_broadcast() {
    let sim = Simulator::start().await;
    let mut controller = connect(&sim).await;
    let mut observer = connect(&sim).await;
    sim.wait_for_peers(2).await;

    controller.send("R").await.unwrap();
    controller.send("MU").await.unwrap();
    sim.wait_for_output("| UP      |").await;
    sim.ticks(30);

    assert_eq!(recv(&mut controller).await, "A2");
    assert_eq!(recv(&mut observer).await, "A2");

    controller.send("S").await.unwrap();
    sim.wait_for_output("| STOPPING|").await;
    sim.ticks(10);

    assert_eq!(recv(&mut controller).await, "S2");
    assert_eq!(recv(&mut observer).await, "S2");

    let summary = sim.quit().await;
    assert_eq!(summary.crash_count, 0);
}

/// A peer that hangs up is dropped; the survivor still gets events.
#[tokio::test]
async fn test_closed_peer_is_removed_silently() {
    let sim = Simulator::start().await;
    let mut survivor = connect(&sim).await;
    let leaver = connect(&sim).await;
    sim.wait_for_peers(2).await;

    leaver.close().await.unwrap();
    sim.wait_for_peers(1).await;

    sim.stdin("DO");
    sim.ticks(21);
    assert_eq!(recv(&mut survivor).await, "O1");
    assert_eq!(sim.peers.len().await, 1);

    sim.quit().await;
}

/// Crashes are reported on the terminal, never on the wire.
#[tokio::test]
async fn test_crash_stays_local() {
    let sim = Simulator::start().await;
    let mut controller = connect(&sim).await;
    sim.wait_for_peers(1).await;

    controller.send("S").await.unwrap();
    controller.send("R").await.unwrap();
    controller.send("DO").await.unwrap();
    sim.wait_for_output("| OPENING |").await;
    sim.ticks(21);

    // The first line on the wire is the door event, not the crash.
    assert_eq!(recv(&mut controller).await, "O1");

    let output = sim.output.clone();
    let summary = sim.quit().await;
    assert_eq!(summary.crash_count, 1);

    let text = spy_text(&output);
    assert!(text.contains("crash: not moving"), "{text}");
    assert!(text.contains("[*FLOOR 1|"), "{text}");
    assert!(text.ends_with("1 crash.\n"), "{text}");
}

/// Disconnecting everyone clears the dashboard's connection marker.
#[tokio::test]
async fn test_connection_marker_follows_peers() {
    let sim = Simulator::start().await;
    let client = connect(&sim).await;
    sim.wait_for_peers(1).await;
    sim.stdin("");
    sim.wait_for_output("[*FLOOR").await;
    client.close().await.unwrap();
    sim.wait_for_peers(0).await;
    sim.stdin("");

    let output = sim.output.clone();
    sim.quit().await;
    let text = spy_text(&output);
    let starred = text.find("[*FLOOR").expect("marker shown while connected");
    let cleared = text.rfind("[ FLOOR").expect("marker cleared after disconnect");
    assert!(cleared > starred, "{text}");
}

/// After the simulator stops the client sees the connection close.
#[tokio::test]
async fn test_client_sees_close_after_shutdown() {
    let sim = Simulator::start().await;
    let mut client = connect(&sim).await;
    sim.wait_for_peers(1).await;
    sim.quit().await;

    let result = timeout(RECV_TIMEOUT, client.recv()).await;
    match result {
        Ok(Err(ClientError::Closed)) | Ok(Err(ClientError::Io(_))) => {}
        other => panic!("expected closed connection, got {other:?}"),
    }
}

/// A garbage byte from a controller crashes the car but keeps the session.
#[tokio::test]
async fn test_invalid_bytes_crash_without_disconnecting() {
    let sim = Simulator::start().await;
    let mut raw = TcpStream::connect(sim.addr).await.expect("Failed to connect");
    sim.wait_for_peers(1).await;

    raw.write_all(b"\xffMU\n").await.unwrap();
    sim.wait_for_output("crash: unknown command - \"\u{fffd}MU\"").await;
    assert_eq!(sim.peers.len().await, 1);

    raw.write_all(b"R\nP2\n").await.unwrap();
    sim.wait_for_output("| CLOSED  | P:-2--").await;
    assert_eq!(sim.peers.len().await, 1);

    let summary = sim.quit().await;
    assert_eq!(summary.crash_count, 1);
}
