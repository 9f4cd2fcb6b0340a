//! Fleeting tic-tac-toe - unified CLI
//!
//! Relay server for networked play and a terminal solo mode.

#![warn(missing_docs)]

mod cli;
mod solo;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use fleeting_session::{ServerConfig, SessionCoordinator};
use solo::SoloOptions;
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, host, port } => run_server(config, host, port).await,
        Command::Solo {
            shape,
            difficulty,
            capacity,
            seed,
            second,
        } => {
            run_solo(SoloOptions {
                shape,
                difficulty,
                capacity,
                seed,
                second,
            })
            .await
        }
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run the room coordinator behind the WebSocket relay
#[instrument(skip_all)]
async fn run_server(config: PathBuf, host: Option<String>, port: Option<u16>) -> Result<()> {
    init_tracing("info,fleeting_session=debug");

    let config = ServerConfig::load(Some(&config))?.with_overrides(host, port);
    info!(
        address = %config.address(),
        room_code_length = config.room_code_length(),
        "Starting fleeting relay server"
    );

    let (handle, _coordinator) =
        fleeting_session::spawn(SessionCoordinator::new(config.room_code_length()));
    fleeting_session::serve(&config, handle).await?;

    Ok(())
}

/// Run a terminal match against the heuristic opponent
async fn run_solo(options: SoloOptions) -> Result<()> {
    init_tracing("warn");
    tokio::task::spawn_blocking(move || solo::run(options)).await?
}
