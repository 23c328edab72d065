//! Command-line interface for strictly_grams.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Strictly Grams - live multiplayer word-stealing game server
#[derive(Parser, Debug)]
#[command(name = "strictly_grams")]
#[command(about = "Lobby-based word-stealing game server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game server (HTTP + WebSocket)
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Match history database (overrides config and DATABASE_PATH)
        #[arg(long)]
        db_path: Option<String>,
    },
}
