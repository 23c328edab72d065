//! Typed wire messages exchanged with connected clients.
//!
//! Every inbound action is one [`ClientAction`] variant and every reply one
//! [`ActionReply`] variant. Payloads are checked by
//! [`ClientAction::validate`] before the game core sees them.

use serde::{Deserialize, Serialize};

use crate::code::LobbyCode;
use crate::error::{ErrorKind, GameError};
use crate::game::{ConnId, FinalScore, MAX_WORD_LEN, PlayerSummary, WordId};

/// Longest accepted display name.
pub const MAX_NAME_LEN: usize = 50;

/// Longest accepted chat message.
pub const MAX_CHAT_LEN: usize = 500;

/// Inbound frame: an action plus an optional correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Echoed back in the reply.
    #[serde(default)]
    pub request_id: Option<u64>,
    /// The requested action.
    #[serde(flatten)]
    pub action: ClientAction,
}

/// Actions a connected player can request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "action", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClientAction {
    /// Open a new lobby.
    CreateLobby {
        /// Name shown to other players.
        display_name: String,
    },
    /// Join an open lobby.
    JoinLobby {
        /// Lobby to join.
        code: LobbyCode,
        /// Name shown to other players.
        display_name: String,
    },
    /// Start the game in a lobby.
    StartGame {
        /// Lobby to start.
        code: LobbyCode,
    },
    /// Draw a tile from the bag.
    DrawTile {
        /// Lobby the player is in.
        code: LobbyCode,
    },
    /// Place a word from the player's own tiles.
    PlaceWord {
        /// Lobby the player is in.
        code: LobbyCode,
        /// Word to place.
        word: String,
        /// Tiles used, one letter each.
        tiles: Vec<char>,
    },
    /// Steal another player's word by extending it.
    StealWord {
        /// Lobby the player is in.
        code: LobbyCode,
        /// Current owner of the word.
        target_player_id: ConnId,
        /// Id of the word to steal.
        base_word_id: WordId,
        /// Extended word.
        proposed_word: String,
    },
    /// Send a chat message to the lobby.
    Chat {
        /// Lobby the player is in.
        code: LobbyCode,
        /// Message text.
        text: String,
    },
}

impl ClientAction {
    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Rejects payloads the game core should never see.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidRequest`] describing the first problem found.
    pub fn validate(&self) -> Result<(), GameError> {
        match self {
            Self::CreateLobby { display_name } | Self::JoinLobby { display_name, .. } => {
                validate_name(display_name)
            }
            Self::StartGame { .. } | Self::DrawTile { .. } => Ok(()),
            Self::PlaceWord { word, tiles, .. } => {
                validate_word_field(word)?;
                if tiles.is_empty() || tiles.len() > MAX_WORD_LEN {
                    return Err(GameError::invalid_request(format!(
                        "tiles must list 1 to {MAX_WORD_LEN} letters"
                    )));
                }
                if let Some(tile) = tiles.iter().find(|t| !t.is_ascii_alphabetic()) {
                    return Err(GameError::invalid_request(format!("'{tile}' is not a letter")));
                }
                Ok(())
            }
            Self::StealWord {
                base_word_id,
                proposed_word,
                ..
            } => {
                if base_word_id.0.trim().is_empty() {
                    return Err(GameError::invalid_request("base_word_id is empty"));
                }
                validate_word_field(proposed_word)
            }
            Self::Chat { text, .. } => {
                let len = text.trim().chars().count();
                if len == 0 || len > MAX_CHAT_LEN {
                    return Err(GameError::invalid_request(format!(
                        "chat text must be 1 to {MAX_CHAT_LEN} characters"
                    )));
                }
                Ok(())
            }
        }
    }
}

fn validate_name(name: &str) -> Result<(), GameError> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(GameError::invalid_request(format!(
            "display name must be 1 to {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_word_field(word: &str) -> Result<(), GameError> {
    let len = word.trim().chars().count();
    if len == 0 || len > MAX_WORD_LEN {
        return Err(GameError::invalid_request(format!(
            "word must be 1 to {MAX_WORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Result of one inbound action, sent only to the requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionReply {
    /// Lobby opened.
    LobbyCreated {
        /// New lobby code.
        code: LobbyCode,
        /// The requester.
        player: PlayerSummary,
    },
    /// Lobby joined.
    LobbyJoined {
        /// Lobby code.
        code: LobbyCode,
        /// The requester.
        player: PlayerSummary,
        /// Everyone in the lobby, including the requester.
        current_players: Vec<PlayerSummary>,
    },
    /// Game started.
    GameStarted,
    /// Tile drawn.
    TileDrawn {
        /// Letter drawn.
        letter: char,
    },
    /// Word placed.
    WordPlaced {
        /// Id of the new word.
        word_id: WordId,
        /// Normalised word.
        word: String,
    },
    /// Word stolen.
    WordStolen {
        /// Id of the word under its new owner.
        new_word_id: WordId,
        /// Normalised word.
        new_word: String,
    },
    /// Chat message broadcast.
    ChatSent,
    /// Action rejected.
    Error {
        /// Classification.
        kind: ErrorKind,
        /// Human-readable reason.
        message: String,
    },
}

impl From<GameError> for ActionReply {
    fn from(err: GameError) -> Self {
        Self::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Broadcast or targeted event describing a state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameEvent {
    /// Someone joined the lobby.
    PlayerJoined {
        /// The new player.
        player: PlayerSummary,
    },
    /// Someone disconnected.
    PlayerLeft {
        /// Departed connection.
        player: ConnId,
        /// Their display name.
        name: String,
    },
    /// Turns began.
    GameStarted {
        /// Players in turn order.
        turn_order: Vec<PlayerSummary>,
    },
    /// A tile left the bag.
    TileFlipped {
        /// Player who received it.
        player: ConnId,
        /// Letter drawn.
        letter: char,
        /// Tiles left in the bag.
        tiles_left: usize,
    },
    /// Sent to the player whose turn began.
    YourTurn {
        /// Index in the turn order.
        turn_index: usize,
        /// Seconds before the turn is skipped.
        timeout_secs: u64,
    },
    /// A turn was skipped for inactivity.
    TurnTimeout {
        /// Player who timed out.
        player: ConnId,
    },
    /// A word was placed.
    WordPlaced {
        /// Owner.
        player: ConnId,
        /// Id of the word.
        word_id: WordId,
        /// Word text.
        word: String,
    },
    /// A word changed owner.
    WordStolen {
        /// New owner.
        thief: ConnId,
        /// Previous owner.
        victim: ConnId,
        /// Id under the previous owner.
        old_word_id: WordId,
        /// Id under the new owner.
        new_word_id: WordId,
        /// Extended word.
        new_word: String,
    },
    /// Chat line.
    ChatMessage {
        /// Sender.
        player: ConnId,
        /// Sender's display name.
        name: String,
        /// Message text.
        text: String,
    },
    /// Final ranked scores.
    GameOver {
        /// Highest score first.
        results: Vec<FinalScore>,
    },
    /// The lobby closed before a game was played.
    LobbyClosed {
        /// Closed lobby.
        code: LobbyCode,
    },
}

impl GameEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to a [`ClientMessage`].
    Reply {
        /// Correlation id from the request.
        request_id: Option<u64>,
        /// Outcome of the action.
        reply: ActionReply,
    },
    /// State change notification.
    Event {
        /// The event.
        event: GameEvent,
    },
}
