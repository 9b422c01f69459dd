use anyhow::{anyhow, Result};
use tokio::sync::mpsc;

use droopy::cli::{Cli, Command};
use droopy::config::{validate_addr, Settings};
use droopy::dashboard::Dashboard;
use droopy::elevator::Elevator;
use droopy::logging;
use droopy::mux::{self, Multiplexer};
use droopy::play;
use droopy::transport::{ControlServer, PeerRegistry};

#[tokio::main]
async fn main() {
    let cli = match Cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    logging::init_tracing();

    let result = match cli.command {
        Some(Command::Play(args)) => play::play_stdin(&args.addr).await.map_err(anyhow::Error::from),
        None => simulate(cli).await,
    };

    let code = match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    };

    // The stdin reader may still be parked in a blocking read; exit
    // without waiting for the runtime to drain it.
    std::process::exit(code);
}

async fn simulate(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(addr) = cli.addr {
        settings.simulator.addr = addr;
    }
    settings.validate()?;

    let sim = &settings.simulator;
    let bind = validate_addr(&sim.addr)?;
    let addr = bind
        .resolve()
        .map_err(|err| anyhow!("resolving {bind}: {err}"))?;
    tracing::debug!(%addr, "address");

    let peers = PeerRegistry::new(sim.broadcast_timeout());
    let server = ControlServer::bind(addr, peers.clone()).await?;

    let (tx, rx) = mpsc::unbounded_channel();
    server.spawn(tx.clone());
    mux::spawn_stdin_reader(tx.clone());
    mux::spawn_signal_watcher(tx.clone());
    mux::spawn_ticker(tx, sim.tick_interval());

    let multiplexer = Multiplexer::new(Elevator::new(), peers, Dashboard::stdout());
    let summary = multiplexer.run(rx).await?;
    tracing::debug!(crashes = summary.crash_count, "simulator stopped");
    Ok(())
}
