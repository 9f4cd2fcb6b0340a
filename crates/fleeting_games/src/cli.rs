//! Command-line interface for fleeting tic-tac-toe.

use clap::{Parser, Subcommand};
use fleeting_tictactoe::{Difficulty, Shape};
use std::path::PathBuf;

/// Fleeting tic-tac-toe - pieces disappear, the board never fills
#[derive(Parser, Debug)]
#[command(name = "fleeting")]
#[command(about = "Tic-tac-toe where the oldest piece vanishes", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the room coordinator and WebSocket relay
    Serve {
        /// Path to a TOML config file (defaults are used if it is missing)
        #[arg(short, long, default_value = "fleeting.toml")]
        config: PathBuf,

        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Play against the computer in the terminal
    Solo {
        /// Board shape: square (3x3) or cube (3x3x3)
        #[arg(long, default_value = "square")]
        shape: Shape,

        /// Opponent strength: easy, medium or hard
        #[arg(short, long, default_value = "medium")]
        difficulty: Difficulty,

        /// Live pieces allowed before the oldest is evicted
        #[arg(long)]
        capacity: Option<usize>,

        /// Seed for the opponent's random choices
        #[arg(long)]
        seed: Option<u64>,

        /// Play O and let the computer open
        #[arg(long)]
        second: bool,
    },
}
