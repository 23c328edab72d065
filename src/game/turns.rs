//! Turn order, idle-turn counting and timeout staleness.
//!
//! The scheduler never sleeps or spawns anything itself. Each time a turn
//! begins it hands out a [`TurnTicket`]; whoever owns the clock arms a timer
//! with that ticket and later asks [`TurnScheduler::is_live`] whether the
//! ticket still describes the current turn. Every turn change bumps the
//! generation, so an old ticket can never match again and no timer ever has
//! to be cancelled. Each scheduler also draws a random epoch, so a ticket
//! from an ended game never matches a later game that reuses its lobby code.

use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::hand::ConnId;
use crate::error::GameError;

/// Minimum connected players for a game to start or continue.
pub const MIN_PLAYERS: usize = 2;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Lobby is open, players may join.
    WaitingToStart,
    /// Turns are rotating.
    InProgress,
    /// Terminal; scores have been computed.
    Ended,
}

/// Snapshot of the turn a timeout was armed for.
///
/// The index is informational only: it can shift when an earlier player
/// leaves without the turn changing hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TurnTicket {
    /// Turn index when the turn began.
    pub turn_index: usize,
    /// Scheduler generation when the turn began.
    pub generation: u64,
    /// Random id of the scheduler that issued the ticket.
    pub epoch: u64,
    /// When the turn began.
    pub started_at: DateTime<Utc>,
}

/// Result of rotating the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStep {
    /// The turn moved to `player`; arm a timeout with `ticket`.
    Next {
        /// Player whose turn it now is.
        player: ConnId,
        /// Ticket for the new turn.
        ticket: TurnTicket,
    },
    /// The idle limit was reached and the scheduler is now [`Phase::Ended`].
    Ended,
}

/// Effect of removing a player from the turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Player was not in the turn order.
    Absent,
    /// Player removed; whoever held the turn still holds it.
    Quiet,
    /// The departing player held the turn; it passed to the next player.
    TurnPassed {
        /// Player whose turn it now is.
        player: ConnId,
        /// Ticket for the new turn.
        ticket: TurnTicket,
    },
    /// Too few players remain; the scheduler is now [`Phase::Ended`].
    Ended,
}

/// Turn state machine for one session.
#[derive(Debug, Clone)]
pub struct TurnScheduler {
    phase: Phase,
    order: Vec<ConnId>,
    current: usize,
    idle_turns: usize,
    idle_rounds_to_end: usize,
    generation: u64,
    epoch: u64,
    last_action_at: DateTime<Utc>,
}

impl TurnScheduler {
    /// Creates a scheduler that ends after `idle_rounds_to_end` silent rounds.
    pub fn new(idle_rounds_to_end: usize, now: DateTime<Utc>) -> Self {
        Self {
            phase: Phase::WaitingToStart,
            order: Vec::new(),
            current: 0,
            idle_turns: 0,
            idle_rounds_to_end,
            generation: 0,
            epoch: OsRng.next_u64(),
            last_action_at: now,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Turn order as a slice of connection ids.
    pub fn order(&self) -> &[ConnId] {
        &self.order
    }

    /// Index into [`Self::order`] of the player holding the turn.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Player holding the turn, if any.
    pub fn current_player(&self) -> Option<ConnId> {
        self.order.get(self.current).copied()
    }

    /// Consecutive turns that ended without an action.
    pub fn idle_turns(&self) -> usize {
        self.idle_turns
    }

    /// Idle turns at which the game ends for the current player count.
    pub fn idle_limit(&self) -> usize {
        self.order.len() * self.idle_rounds_to_end
    }

    /// Monotonic counter bumped on every turn change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Random id distinguishing this scheduler's tickets from any other's.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Time the current turn began.
    pub fn last_action_at(&self) -> DateTime<Utc> {
        self.last_action_at
    }

    /// Ticket describing the current turn.
    pub fn ticket(&self) -> TurnTicket {
        TurnTicket {
            turn_index: self.current,
            generation: self.generation,
            epoch: self.epoch,
            started_at: self.last_action_at,
        }
    }

    /// Appends a player to the end of the turn order.
    #[instrument(skip(self))]
    pub fn add_player(&mut self, conn: ConnId) {
        if !self.order.contains(&conn) {
            self.order.push(conn);
        }
    }

    /// Moves from [`Phase::WaitingToStart`] to [`Phase::InProgress`].
    ///
    /// # Errors
    ///
    /// [`GameError::AlreadyStarted`] outside the waiting phase,
    /// [`GameError::InsufficientPlayers`] with fewer than two players.
    #[instrument(skip(self), fields(players = self.order.len()))]
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<TurnStep, GameError> {
        if self.phase != Phase::WaitingToStart {
            return Err(GameError::AlreadyStarted);
        }
        if self.order.len() < MIN_PLAYERS {
            return Err(GameError::InsufficientPlayers {
                count: self.order.len(),
            });
        }
        self.phase = Phase::InProgress;
        self.current = 0;
        self.idle_turns = 0;
        info!("Turn rotation started");
        Ok(self.begin_turn(now))
    }

    /// Ends the current turn and rotates to the next player.
    ///
    /// # Errors
    ///
    /// [`GameError::GameNotActive`] unless in progress.
    #[instrument(skip(self), fields(current = self.current, idle = self.idle_turns))]
    pub fn advance(&mut self, action_taken: bool, now: DateTime<Utc>) -> Result<TurnStep, GameError> {
        if self.phase != Phase::InProgress {
            return Err(GameError::GameNotActive);
        }
        if action_taken {
            self.idle_turns = 0;
        } else {
            self.idle_turns += 1;
        }
        if self.idle_turns >= self.idle_limit() {
            info!(idle_turns = self.idle_turns, "Idle limit reached");
            self.finish();
            return Ok(TurnStep::Ended);
        }
        self.current = (self.current + 1) % self.order.len();
        Ok(self.begin_turn(now))
    }

    /// Whether a timeout armed with `ticket` should still fire.
    ///
    /// The ticket must come from this scheduler, and neither the turn nor its
    /// start time may have changed since it was issued.
    pub fn is_live(&self, ticket: TurnTicket) -> bool {
        self.phase == Phase::InProgress
            && self.epoch == ticket.epoch
            && self.generation == ticket.generation
            && self.last_action_at == ticket.started_at
    }

    /// Removes a departing player, keeping the current index valid.
    #[instrument(skip(self))]
    pub fn remove_player(&mut self, conn: ConnId, now: DateTime<Utc>) -> Removal {
        let Some(position) = self.order.iter().position(|c| *c == conn) else {
            return Removal::Absent;
        };
        self.order.remove(position);

        if self.phase != Phase::InProgress {
            self.current = 0;
            return Removal::Quiet;
        }
        if self.order.len() < MIN_PLAYERS {
            info!(remaining = self.order.len(), "Too few players remain");
            self.finish();
            return Removal::Ended;
        }

        match position.cmp(&self.current) {
            std::cmp::Ordering::Less => {
                self.current -= 1;
                Removal::Quiet
            }
            std::cmp::Ordering::Equal => {
                // The slot now holds the next player in rotation.
                self.current %= self.order.len();
                match self.begin_turn(now) {
                    TurnStep::Next { player, ticket } => Removal::TurnPassed { player, ticket },
                    TurnStep::Ended => Removal::Ended,
                }
            }
            std::cmp::Ordering::Greater => Removal::Quiet,
        }
    }

    /// Moves to [`Phase::Ended`]. Returns `false` if it was already ended.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn finish(&mut self) -> bool {
        if self.phase == Phase::Ended {
            return false;
        }
        self.phase = Phase::Ended;
        self.generation += 1;
        true
    }

    #[instrument(skip(self, now))]
    fn begin_turn(&mut self, now: DateTime<Utc>) -> TurnStep {
        self.generation += 1;
        self.last_action_at = now;
        let player = self.order[self.current];
        debug!(%player, turn_index = self.current, generation = self.generation, "Turn begins");
        TurnStep::Next {
            player,
            ticket: self.ticket(),
        }
    }
}
