use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_ADDR;
use crate::dashboard::HELP;

/// Elevator simulator driven over a line-oriented TCP protocol.
#[derive(Debug, Parser)]
#[command(name = "droopy", version, after_help = HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Control listener address [default: :10000]
    #[arg(long, value_name = "HOST:PORT")]
    pub addr: Option<String>,

    /// Settings file [default: <config dir>/droopy/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a SEND / SLEEP / WAIT script from stdin against a simulator
    Play(PlayArgs),
}

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Simulator address
    #[arg(long, value_name = "HOST:PORT", default_value = DEFAULT_ADDR)]
    pub addr: String,
}

const LEGACY_FLAGS: [&str; 3] = ["addr", "config", "version"];

impl Cli {
    pub fn parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }
}

/// Rewrite single-dash long flags (`-addr :9000`, `-version`) to the
/// double-dash form clap expects. Everything after `--` is left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }
            match arg.to_str().and_then(legacy_flag) {
                Some(rewritten) => rewritten.into(),
                None => arg,
            }
        })
        .collect()
}

fn legacy_flag(arg: &str) -> Option<String> {
    let flag = arg.strip_prefix('-').filter(|rest| !rest.starts_with('-'))?;
    let name = flag.split_once('=').map_or(flag, |(name, _)| name);
    LEGACY_FLAGS.contains(&name).then(|| format!("-{arg}"))
}
