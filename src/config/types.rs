use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub simulator: SimulatorSettings,
}

/// `[simulator]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorSettings {
    /// Control listener address (host:port, empty host = all interfaces).
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Wall-clock length of one tick in milliseconds (default: 100).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Per-peer deadline for an event write in milliseconds (default: 1000).
    #[serde(default = "default_broadcast_timeout_ms")]
    pub broadcast_timeout_ms: u64,
}

impl SimulatorSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_millis(self.broadcast_timeout_ms)
    }
}

pub const DEFAULT_ADDR: &str = ":10000";

fn default_addr() -> String {
    DEFAULT_ADDR.to_string()
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_broadcast_timeout_ms() -> u64 {
    1000
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            tick_interval_ms: default_tick_interval_ms(),
            broadcast_timeout_ms: default_broadcast_timeout_ms(),
        }
    }
}
