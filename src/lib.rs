pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod elevator;
pub mod logging;
pub mod mux;
pub mod play;
pub mod transport;
