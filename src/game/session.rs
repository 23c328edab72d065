//! In-memory state of one live game.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use super::hand::{AccountRef, ConnId, PlayerHand, PlayerSummary, WordId};
use super::scoring::{MatchSummary, rank_standings};
use super::tiles::TileBag;
use super::turns::{MIN_PLAYERS, Phase, Removal, TurnScheduler, TurnStep, TurnTicket};
use crate::code::LobbyCode;
use crate::config::GameRules;
use crate::error::GameError;

/// What happened to the turn after an accepted action.
#[derive(Debug, Clone)]
pub enum TurnChange {
    /// Turn passed to `player`; a timeout should be armed with `ticket`.
    Next {
        /// Player whose turn it now is.
        player: ConnId,
        /// Ticket for the new turn.
        ticket: TurnTicket,
    },
    /// The game ended; the summary holds final standings.
    GameOver(MatchSummary),
}

/// Outcome of starting the game.
#[derive(Debug, Clone)]
pub struct Started {
    /// One opening tile per player, in turn order.
    pub dealt: Vec<(ConnId, char)>,
    /// Turn order for the game.
    pub turn_order: Vec<ConnId>,
    /// First turn.
    pub change: TurnChange,
}

/// Outcome of drawing a tile.
#[derive(Debug, Clone)]
pub struct Drawn {
    /// Letter drawn.
    pub letter: char,
    /// Tiles left in the bag.
    pub tiles_left: usize,
    /// Turn after the draw.
    pub change: TurnChange,
}

/// Outcome of a live turn timeout.
#[derive(Debug, Clone)]
pub struct Expired {
    /// Player whose turn timed out.
    pub player: ConnId,
    /// Turn after the timeout.
    pub change: TurnChange,
}

/// Outcome of a player leaving.
#[derive(Debug, Clone)]
pub struct Departure {
    /// Who left.
    pub player: PlayerSummary,
    /// Turn change caused by the departure, if any.
    pub change: Option<TurnChange>,
    /// A lobby that never started dropped below two players and must close.
    pub lobby_closed: bool,
}

/// One live game: bag, hands and turn state behind a lobby code.
///
/// Every tile is always in exactly one of: the bag, a hand, a placed word, or
/// the retired pile of departed players. [`GameSession::tile_total`] sums all
/// four and always equals [`super::tiles::TOTAL_TILES`].
#[derive(Debug, Clone)]
pub struct GameSession {
    code: LobbyCode,
    created_at: DateTime<Utc>,
    max_players: usize,
    pub(crate) bag: TileBag,
    pub(crate) players: HashMap<ConnId, PlayerHand>,
    pub(crate) turns: TurnScheduler,
    retired_tiles: usize,
    words_issued: u64,
}

impl GameSession {
    /// Creates a session with a freshly shuffled bag.
    pub fn new(code: LobbyCode, rules: &GameRules, now: DateTime<Utc>) -> Self {
        Self::with_bag(code, TileBag::shuffled(), rules, now)
    }

    /// Creates a session around a specific bag.
    #[instrument(skip(bag, rules, now))]
    pub fn with_bag(code: LobbyCode, bag: TileBag, rules: &GameRules, now: DateTime<Utc>) -> Self {
        info!(code = %code, "Creating game session");
        Self {
            code,
            created_at: now,
            max_players: *rules.max_players(),
            bag,
            players: HashMap::new(),
            turns: TurnScheduler::new(*rules.idle_rounds_to_end(), now),
            retired_tiles: 0,
            words_issued: 0,
        }
    }

    /// Lobby code.
    pub fn code(&self) -> &LobbyCode {
        &self.code
    }

    /// When the lobby was opened.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.turns.phase()
    }

    /// Turn scheduler (read only).
    pub fn turns(&self) -> &TurnScheduler {
        &self.turns
    }

    /// Tile bag (read only).
    pub fn bag(&self) -> &TileBag {
        &self.bag
    }

    /// A player's hand.
    pub fn hand(&self, conn: ConnId) -> Option<&PlayerHand> {
        self.players.get(&conn)
    }

    /// Number of connected players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Whether `conn` is part of this session.
    pub fn has_player(&self, conn: ConnId) -> bool {
        self.players.contains_key(&conn)
    }

    /// Connected players in turn order.
    pub fn roster(&self) -> Vec<PlayerSummary> {
        self.turns
            .order()
            .iter()
            .filter_map(|conn| self.players.get(conn))
            .map(PlayerHand::summary)
            .collect()
    }

    /// Tiles accounted for across bag, hands, placed words and retired hands.
    pub fn tile_total(&self) -> usize {
        self.bag.len()
            + self.players.values().map(PlayerHand::tile_count).sum::<usize>()
            + self.retired_tiles
    }

    /// Adds a player to a lobby that has not started.
    ///
    /// # Errors
    ///
    /// [`GameError::AlreadyStarted`] once the game began,
    /// [`GameError::LobbyFull`] at capacity.
    #[instrument(skip(self, account), fields(code = %self.code))]
    pub fn add_player(
        &mut self,
        conn: ConnId,
        name: String,
        account: Option<AccountRef>,
    ) -> Result<PlayerSummary, GameError> {
        if self.phase() != Phase::WaitingToStart {
            warn!("Join rejected, game already started");
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() >= self.max_players {
            warn!(max = self.max_players, "Join rejected, lobby full");
            return Err(GameError::LobbyFull {
                max: self.max_players,
            });
        }
        let hand = PlayerHand::new(conn, name, account);
        let summary = hand.summary();
        self.players.insert(conn, hand);
        self.turns.add_player(conn);
        info!(player = %conn, name = %summary.name, "Player joined");
        Ok(summary)
    }

    /// Starts the game: one tile to each player, first turn to index 0.
    ///
    /// # Errors
    ///
    /// [`GameError::PlayerNotFound`] for non-members, plus any scheduler
    /// start error.
    #[instrument(skip(self, now), fields(code = %self.code))]
    pub fn start(&mut self, requester: ConnId, now: DateTime<Utc>) -> Result<Started, GameError> {
        if !self.has_player(requester) {
            return Err(GameError::PlayerNotFound { player: requester });
        }
        let step = self.turns.start(now)?;

        let turn_order = self.turns.order().to_vec();
        let mut dealt = Vec::with_capacity(turn_order.len());
        for conn in &turn_order {
            let Ok(letter) = self.bag.draw() else {
                break;
            };
            if let Some(hand) = self.players.get_mut(conn) {
                hand.receive(letter);
                dealt.push((*conn, letter));
            }
        }
        info!(players = turn_order.len(), "Game started");

        Ok(Started {
            dealt,
            turn_order,
            change: self.turn_change(step, now),
        })
    }

    /// Draws one tile into the current player's hand and ends their turn.
    ///
    /// # Errors
    ///
    /// Turn errors, or [`GameError::EmptyBag`] without advancing the turn.
    #[instrument(skip(self, now), fields(code = %self.code))]
    pub fn draw_tile(&mut self, conn: ConnId, now: DateTime<Utc>) -> Result<Drawn, GameError> {
        self.require_turn(conn)?;
        let letter = self.bag.draw()?;
        if let Some(hand) = self.players.get_mut(&conn) {
            hand.receive(letter);
        }
        debug!(player = %conn, %letter, left = self.bag.len(), "Tile drawn");
        let step = self.turns.advance(true, now)?;
        Ok(Drawn {
            letter,
            tiles_left: self.bag.len(),
            change: self.turn_change(step, now),
        })
    }

    /// Applies a fired timeout if its ticket still matches the current turn.
    ///
    /// Returns `None` for stale tickets, leaving the session untouched.
    #[instrument(skip(self, now), fields(code = %self.code))]
    pub fn expire_turn(&mut self, ticket: TurnTicket, now: DateTime<Utc>) -> Option<Expired> {
        if !self.turns.is_live(ticket) {
            debug!(?ticket, "Stale timeout ignored");
            return None;
        }
        let player = self.turns.current_player()?;
        info!(%player, "Turn timed out");
        let step = self.turns.advance(false, now).ok()?;
        Some(Expired {
            player,
            change: self.turn_change(step, now),
        })
    }

    /// Removes a player, retiring their letters and words from circulation.
    #[instrument(skip(self, now), fields(code = %self.code))]
    pub fn remove_player(&mut self, conn: ConnId, now: DateTime<Utc>) -> Option<Departure> {
        let hand = self.players.remove(&conn)?;
        self.retired_tiles += hand.tile_count();
        info!(player = %conn, retired = hand.tile_count(), "Player left");

        let change = match self.turns.remove_player(conn, now) {
            Removal::Absent | Removal::Quiet => None,
            Removal::TurnPassed { player, ticket } => Some(TurnChange::Next { player, ticket }),
            Removal::Ended => Some(TurnChange::GameOver(self.summary(now))),
        };
        Some(Departure {
            player: hand.summary(),
            change,
            lobby_closed: self.phase() == Phase::WaitingToStart
                && self.players.len() < MIN_PLAYERS,
        })
    }

    /// Final standings of connected players, in turn order before ranking.
    #[instrument(skip(self), fields(code = %self.code))]
    pub fn summary(&self, ended_at: DateTime<Utc>) -> MatchSummary {
        let hands = self
            .turns
            .order()
            .iter()
            .filter_map(|conn| self.players.get(conn));
        MatchSummary::new(
            self.code.clone(),
            self.created_at,
            ended_at,
            rank_standings(hands),
        )
    }

    /// Checks that `conn` may act right now.
    #[instrument(skip(self), fields(code = %self.code))]
    pub(crate) fn require_turn(&self, conn: ConnId) -> Result<(), GameError> {
        if self.phase() != Phase::InProgress {
            return Err(GameError::GameNotActive);
        }
        if !self.has_player(conn) {
            return Err(GameError::PlayerNotFound { player: conn });
        }
        if self.turns.current_player() != Some(conn) {
            warn!(player = %conn, "Action out of turn");
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    #[instrument(skip(self, now), fields(code = %self.code))]
    pub(crate) fn turn_change(&self, step: TurnStep, now: DateTime<Utc>) -> TurnChange {
        match step {
            TurnStep::Next { player, ticket } => TurnChange::Next { player, ticket },
            TurnStep::Ended => TurnChange::GameOver(self.summary(now)),
        }
    }

    /// Issues the next word id. Ids are never reused within a session, even
    /// after the word they named was stolen or retired.
    #[instrument(skip(self), fields(code = %self.code))]
    pub(crate) fn fresh_word_id(&mut self) -> WordId {
        self.words_issued += 1;
        WordId(format!("w{}", self.words_issued))
    }
}
