//! Message producers: the tick clock, line readers, and the signal watcher.
//!
//! Each producer runs as its own task and only ever talks to the
//! multiplexer through the channel. When the receiver is gone they stop.

use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{LineReader, Message, Origin};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Send `T` every `period`.
pub fn spawn_ticker(tx: UnboundedSender<Message>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        // Late ticks are delivered, not skipped.
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            interval.tick().await;
            if tx.send(Message::new(Origin::Ticker, "T")).is_err() {
                break;
            }
        }
    })
}

/// Forward every line of `reader`, then `EOF` once the input ends or fails.
pub fn spawn_line_reader<R>(reader: R, origin: Origin, tx: UnboundedSender<Message>) -> JoinHandle<()>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut lines = LineReader::new(reader);
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(Message::new(origin, line)).is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::debug!(%origin, error = %err, "input read failed");
                    break;
                }
            }
        }
        let _ = tx.send(Message::new(origin, Message::EOF));
    })
}

pub fn spawn_stdin_reader(tx: UnboundedSender<Message>) -> JoinHandle<()> {
    spawn_line_reader(tokio::io::stdin(), Origin::Stdin, tx)
}

/// Turn the first interrupt (or SIGTERM on unix) into `Q`.
pub fn spawn_signal_watcher(tx: UnboundedSender<Message>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(()) => {
                tracing::debug!("shutdown signal received");
                let _ = tx.send(Message::new(Origin::Signal, Message::QUIT));
            }
            Err(err) => tracing::warn!(error = %err, "cannot install signal handler"),
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = sigterm.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
