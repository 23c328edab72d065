//! Strictly Grams - game server binary.

#![warn(missing_docs)]

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use strictly_grams::{
    AppState, Dictionary, GameService, MatchRepository, PermissiveDictionary, RoomHub,
    ServerConfig, SessionRegistry, WordList, serve,
};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_grams=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            db_path,
        } => run_server(config, host, port, db_path).await,
    }
}

/// Run the game server
#[instrument(skip_all)]
async fn run_server(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    db_path: Option<String>,
) -> Result<()> {
    let config = match &config_path {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    let db_path = db_path.or_else(|| std::env::var("DATABASE_PATH").ok());
    let config = config.with_overrides(host, port, db_path);
    info!(?config, "Starting Strictly Grams server");

    let dictionary: Arc<dyn Dictionary> = match config.dictionary_path() {
        Some(path) => {
            let words = WordList::from_file(path)?;
            info!(words = words.len(), "Dictionary loaded");
            Arc::new(words)
        }
        None => {
            warn!("No dictionary configured, accepting any alphabetic word");
            Arc::new(PermissiveDictionary)
        }
    };

    let repo = MatchRepository::open(config.database_path().clone())?;
    let hub = Arc::new(RoomHub::new());
    let service = GameService::new(
        SessionRegistry::new(),
        dictionary,
        hub.clone(),
        Arc::new(repo.clone()),
        config.rules(),
    );

    let state = AppState::new(service, hub, repo, config.allowed_origin().clone());
    serve(config.host(), *config.port(), state).await
}
