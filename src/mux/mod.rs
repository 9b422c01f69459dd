//! The single consumer that drives the elevator.
//!
//! All producers feed one channel; the multiplexer owns the only mutable
//! handle to the [`Elevator`] and applies messages strictly in arrival
//! order.

mod lines;
mod message;
mod sources;

use std::io::{self, Write};

use tokio::sync::mpsc::UnboundedReceiver;

use crate::dashboard::{render_status, Dashboard};
use crate::elevator::{Elevator, Outcome};
use crate::transport::PeerRegistry;

pub use lines::{LineReader, MAX_LINE_LEN};
pub use message::{Message, Origin};
pub use sources::{
    spawn_line_reader, spawn_signal_watcher, spawn_stdin_reader, spawn_ticker,
    DEFAULT_TICK_INTERVAL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub crash_count: u32,
}

pub struct Multiplexer<W: Write> {
    elevator: Elevator,
    peers: PeerRegistry,
    dashboard: Dashboard<W>,
}

impl<W: Write> Multiplexer<W> {
    pub fn new(elevator: Elevator, peers: PeerRegistry, dashboard: Dashboard<W>) -> Self {
        Self {
            elevator,
            peers,
            dashboard,
        }
    }

    pub fn elevator(&self) -> &Elevator {
        &self.elevator
    }

    pub fn dashboard(&self) -> &Dashboard<W> {
        &self.dashboard
    }

    /// Consume messages until shutdown is requested or every producer
    /// has gone away, then print the summary.
    pub async fn run(mut self, mut rx: UnboundedReceiver<Message>) -> io::Result<RunSummary> {
        let line = self.status_line().await;
        self.dashboard.start(line)?;

        while let Some(msg) = rx.recv().await {
            if self.dispatch(msg).await? == Flow::Shutdown {
                break;
            }
        }

        let summary = RunSummary {
            crash_count: self.elevator.crash_count(),
        };
        self.dashboard.finish(&summary)?;
        Ok(summary)
    }

    /// Apply one message.
    pub async fn dispatch(&mut self, msg: Message) -> io::Result<Flow> {
        if msg.payload == "T" {
            tracing::trace!(%msg, "tick");
        } else {
            tracing::debug!(%msg, "message");
        }

        if msg.is_shutdown() {
            return Ok(Flow::Shutdown);
        }

        let mut outcome = Outcome::Silent;
        match msg.payload.as_str() {
            "" => {}
            Message::HELP => self.dashboard.show_help()?,
            cmd => {
                outcome = self.elevator.handle(cmd);
                if outcome.is_broadcast() {
                    let event = outcome.to_string();
                    let reached = self.peers.broadcast(&event).await;
                    tracing::debug!(%event, reached, "event");
                }
            }
        }

        let force = msg.payload.is_empty() || msg.payload == Message::HELP;
        let crash = outcome.is_crash().then(|| outcome.to_string());
        let line = self.status_line().await;
        self.dashboard
            .update(line, msg.origin, crash.as_deref(), force)?;

        Ok(Flow::Continue)
    }

    async fn status_line(&self) -> String {
        render_status(&self.elevator, self.peers.is_connected().await)
    }
}
