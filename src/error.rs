//! Error taxonomy for lobby and gameplay operations.

use serde::{Deserialize, Serialize};

use crate::code::LobbyCode;
use crate::db::DbError;
use crate::game::{ConnId, WordId};

/// Wire-level classification of a [`GameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown lobby, player or word.
    NotFound,
    /// Action attempted outside the actor's turn.
    NotYourTurn,
    /// The actor does not hold the letters they claimed.
    TilesUnavailable,
    /// Claimed tiles do not spell the word.
    TilesMismatch,
    /// Rejected by the dictionary or malformed.
    InvalidWord,
    /// Proposed word is not an extension of the base word.
    InvalidSteal,
    /// The tile bag has no letters left.
    EmptyBag,
    /// Lobby reached its player capacity.
    LobbyFull,
    /// Lobby already left the waiting phase.
    AlreadyStarted,
    /// Session is not in progress.
    GameNotActive,
    /// Fewer than two players are connected.
    InsufficientPlayers,
    /// Every lobby code attempt collided.
    CodeGenerationExhausted,
    /// Match history could not be written.
    PersistenceFailure,
    /// Payload rejected before reaching the game core.
    InvalidRequest,
}

/// Errors returned by game operations.
///
/// None of these mutate session state or advance the turn.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GameError {
    /// No live lobby with this code.
    #[display("Lobby {code} not found")]
    LobbyNotFound {
        /// Requested lobby code.
        code: LobbyCode,
    },

    /// Player is not part of the session.
    #[display("Player {player} not found")]
    PlayerNotFound {
        /// Requested connection.
        player: ConnId,
    },

    /// Player has no placed word with this id.
    #[display("Word {word_id} not found for player {player}")]
    WordNotFound {
        /// Owner that was searched.
        player: ConnId,
        /// Missing word id.
        word_id: WordId,
    },

    /// It is another player's turn.
    #[display("Not your turn")]
    NotYourTurn,

    /// A requested letter is missing from the actor's hand.
    #[display("Tile '{letter}' is not in your hand")]
    TilesUnavailable {
        /// First letter that could not be supplied.
        letter: char,
    },

    /// The requested tiles are not exactly the letters of the word.
    #[display("Tiles do not spell '{word}'")]
    TilesMismatch {
        /// Normalised word.
        word: String,
    },

    /// The dictionary rejected the word, or it is not a plain A-Z word.
    #[display("'{word}' is not a valid word")]
    InvalidWord {
        /// Normalised word.
        word: String,
    },

    /// The proposed word does not extend the base word.
    #[display("'{proposed}' does not extend '{base}'")]
    InvalidSteal {
        /// Word being stolen.
        base: String,
        /// Word proposed by the thief.
        proposed: String,
    },

    /// No tiles left to draw.
    #[display("No tiles left")]
    EmptyBag,

    /// Lobby is at capacity.
    #[display("Lobby is full ({max} players)")]
    LobbyFull {
        /// Capacity of the lobby.
        max: usize,
    },

    /// The game has already started.
    #[display("Game already started")]
    AlreadyStarted,

    /// The session is not accepting gameplay actions.
    #[display("Game is not in progress")]
    GameNotActive,

    /// At least two players are needed.
    #[display("Need at least 2 players to start, have {count}")]
    InsufficientPlayers {
        /// Connected players.
        count: usize,
    },

    /// Lobby code generation collided on every attempt.
    #[display("Could not generate lobby code after {attempts} attempts")]
    CodeGenerationExhausted {
        /// Attempts made.
        attempts: usize,
    },

    /// Match history could not be stored.
    #[display("Persistence failure: {message}")]
    PersistenceFailure {
        /// Underlying storage error.
        message: String,
    },

    /// Malformed inbound payload.
    #[display("Invalid request: {reason}")]
    InvalidRequest {
        /// Why the payload was rejected.
        reason: String,
    },
}

impl std::error::Error for GameError {}

impl GameError {
    /// Creates an [`GameError::InvalidRequest`].
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Returns the wire-level classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LobbyNotFound { .. } | Self::PlayerNotFound { .. } | Self::WordNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::NotYourTurn => ErrorKind::NotYourTurn,
            Self::TilesUnavailable { .. } => ErrorKind::TilesUnavailable,
            Self::TilesMismatch { .. } => ErrorKind::TilesMismatch,
            Self::InvalidWord { .. } => ErrorKind::InvalidWord,
            Self::InvalidSteal { .. } => ErrorKind::InvalidSteal,
            Self::EmptyBag => ErrorKind::EmptyBag,
            Self::LobbyFull { .. } => ErrorKind::LobbyFull,
            Self::AlreadyStarted => ErrorKind::AlreadyStarted,
            Self::GameNotActive => ErrorKind::GameNotActive,
            Self::InsufficientPlayers { .. } => ErrorKind::InsufficientPlayers,
            Self::CodeGenerationExhausted { .. } => ErrorKind::CodeGenerationExhausted,
            Self::PersistenceFailure { .. } => ErrorKind::PersistenceFailure,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
        }
    }
}

impl From<DbError> for GameError {
    fn from(err: DbError) -> Self {
        Self::PersistenceFailure {
            message: err.to_string(),
        }
    }
}
