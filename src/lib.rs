//! Strictly Grams library - live multiplayer word-stealing game engine
//!
//! Players gather in short-code lobbies, take turns flipping letter tiles
//! from a shared bag, form words from their own tiles, and steal opponents'
//! words by extending them. The game ends when the bag runs dry or the table
//! goes quiet; results are ranked and saved.
//!
//! # Architecture
//!
//! - **Game**: pure per-lobby state machine (tiles, hands, turns, ledger, scoring)
//! - **Registry**: live sessions keyed by lobby code
//! - **Engine**: action dispatch, turn timers, end-of-game pipeline
//! - **Notify**: rooms and per-connection event delivery
//! - **Db**: match history in SQLite via diesel
//! - **Server**: axum HTTP + WebSocket transport
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_grams::{
//!     GameService, MatchRepository, PermissiveDictionary, RoomHub, ServerConfig,
//!     SessionRegistry,
//! };
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::default();
//! let repo = MatchRepository::open(config.database_path().clone())?;
//! let service = GameService::new(
//!     SessionRegistry::new(),
//!     Arc::new(PermissiveDictionary),
//!     Arc::new(RoomHub::new()),
//!     Arc::new(repo),
//!     config.rules(),
//! );
//! # let _ = service;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod code;
mod config;
mod db;
mod dictionary;
mod engine;
mod error;
mod game;
mod notify;
mod protocol;
mod registry;
mod server;

// Crate-level exports - Errors
pub use error::{ErrorKind, GameError};

// Crate-level exports - Lobby codes
pub use code::{CodeGenerator, LOBBY_CODE_ALPHABET, LOBBY_CODE_LEN, LobbyCode, RandomCodes};

// Crate-level exports - Configuration
pub use config::{ConfigError, GameRules, ServerConfig};

// Crate-level exports - Game core
pub use game::{
    AccountRef, ConnId, Departure, Drawn, Expired, FinalScore, GameSession, LetterCounts,
    MAX_WORD_LEN, MIN_PLAYERS, MatchSummary, Phase, Placement, PlacedWord, PlayerHand,
    PlayerSummary, Removal, Standing, Started, Steal, TILE_DISTRIBUTION, TOTAL_TILES, TileBag,
    TurnChange, TurnScheduler, TurnStep, TurnTicket, WordId, added_letters, normalize_word,
    rank_standings, word_score,
};

// Crate-level exports - Dictionary
pub use dictionary::{Dictionary, PermissiveDictionary, WordList};

// Crate-level exports - Sessions and orchestration
pub use engine::GameService;
pub use registry::{Host, SessionRegistry, SharedSession, lock_session};

// Crate-level exports - Notifications and wire protocol
pub use notify::{Notifier, RoomHub, Target};
pub use protocol::{
    ActionReply, ClientAction, ClientMessage, GameEvent, MAX_CHAT_LEN, MAX_NAME_LEN, ServerMessage,
};

// Crate-level exports - Persistence
pub use db::{
    DbError, DbErrorKind, MatchPlayerRecord, MatchRecord, MatchRepository, MatchStore, NewMatch,
    NewMatchPlayer, NewWordPlayed, WordPlayedRecord,
};

// Crate-level exports - Transport
pub use server::{ACCOUNT_HEADER, AppState, HistoryQuery, MatchHistory, router, serve};
