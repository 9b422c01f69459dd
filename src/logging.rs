//! Diagnostic tracing, off unless `DEBUG` is set.
//!
//! The dashboard owns stdout, so no subscriber is installed by default.

use std::ffi::OsStr;

use tracing_subscriber::EnvFilter;

/// Name of the environment switch that turns tracing on.
pub const DEBUG_ENV: &str = "DEBUG";

pub fn debug_enabled() -> bool {
    switched_on(std::env::var_os(DEBUG_ENV).as_deref())
}

/// Any non-empty value turns tracing on, including `0` and `false`.
fn switched_on(value: Option<&OsStr>) -> bool {
    value.is_some_and(|value| !value.is_empty())
}

/// Install a stdout subscriber when `DEBUG` is non-empty.
///
/// `RUST_LOG` refines the filter; it defaults to `debug`. Returns whether
/// a subscriber was installed.
pub fn init_tracing() -> bool {
    if !debug_enabled() {
        return false;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .try_init()
        .is_ok()
}
