//! Orchestration of player actions, turn timers and end-of-game processing.
//!
//! Every handler follows the same shape: look the session up, lock it, run
//! the synchronous game operation, emit notifications and arm the next turn
//! timer while still holding the lock, then release it. Only the end-of-game
//! pipeline awaits (on the match store), and it runs after the lock is gone
//! and the session is already [`Phase::Ended`](crate::game::Phase::Ended),
//! so no other handler can act on a session mid-teardown.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::code::LobbyCode;
use crate::config::GameRules;
use crate::db::MatchStore;
use crate::dictionary::Dictionary;
use crate::error::GameError;
use crate::game::{
    AccountRef, ConnId, MatchSummary, PlacedWord, PlayerSummary, TurnChange, TurnTicket, WordId,
};
use crate::notify::{Notifier, Target};
use crate::protocol::{ActionReply, ClientAction, GameEvent};
use crate::registry::{Host, SessionRegistry, lock_session};

struct Inner {
    registry: SessionRegistry,
    dictionary: Arc<dyn Dictionary>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn MatchStore>,
    rules: GameRules,
}

/// Entry point for every inbound action and timer.
#[derive(Clone)]
pub struct GameService {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for GameService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService")
            .field("registry", &self.inner.registry)
            .field("rules", &self.inner.rules)
            .finish()
    }
}

impl GameService {
    /// Wires the service to its collaborators.
    pub fn new(
        registry: SessionRegistry,
        dictionary: Arc<dyn Dictionary>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn MatchStore>,
        rules: GameRules,
    ) -> Self {
        info!(?rules, "Creating game service");
        Self {
            inner: Arc::new(Inner {
                registry,
                dictionary,
                notifier,
                store,
                rules,
            }),
        }
    }

    /// Live sessions.
    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    /// Rules applied to new sessions.
    pub fn rules(&self) -> &GameRules {
        &self.inner.rules
    }

    /// Validates an action and routes it to its handler.
    #[instrument(skip(self, account, action), fields(action = action.name()))]
    pub async fn dispatch(
        &self,
        conn: ConnId,
        account: Option<AccountRef>,
        action: ClientAction,
    ) -> ActionReply {
        if let Err(err) = action.validate() {
            warn!(%conn, error = %err, "Rejected malformed action");
            return err.into();
        }
        let name = action.name();

        let result = match action {
            ClientAction::CreateLobby { display_name } => self
                .create_lobby(conn, display_name, account)
                .map(|(code, player)| ActionReply::LobbyCreated { code, player }),
            ClientAction::JoinLobby { code, display_name } => self
                .join_lobby(conn, &code, display_name, account)
                .map(|(player, current_players)| ActionReply::LobbyJoined {
                    code,
                    player,
                    current_players,
                }),
            ClientAction::StartGame { code } => self
                .start_game(conn, &code)
                .await
                .map(|()| ActionReply::GameStarted),
            ClientAction::DrawTile { code } => self
                .draw_tile(conn, &code)
                .await
                .map(|letter| ActionReply::TileDrawn { letter }),
            ClientAction::PlaceWord { code, word, tiles } => self
                .place_word(conn, &code, &word, &tiles)
                .await
                .map(|placed| ActionReply::WordPlaced {
                    word_id: placed.id().clone(),
                    word: placed.text().clone(),
                }),
            ClientAction::StealWord {
                code,
                target_player_id,
                base_word_id,
                proposed_word,
            } => self
                .steal_word(conn, &code, target_player_id, &base_word_id, &proposed_word)
                .await
                .map(|stolen| ActionReply::WordStolen {
                    new_word_id: stolen.id().clone(),
                    new_word: stolen.text().clone(),
                }),
            ClientAction::Chat { code, text } => {
                self.chat(conn, &code, &text).map(|()| ActionReply::ChatSent)
            }
        };

        result.unwrap_or_else(|err| {
            warn!(%conn, action = name, error = %err, "Action rejected");
            err.into()
        })
    }

    /// Opens a lobby with `conn` as host.
    #[instrument(skip(self, account))]
    pub fn create_lobby(
        &self,
        conn: ConnId,
        display_name: String,
        account: Option<AccountRef>,
    ) -> Result<(LobbyCode, PlayerSummary), GameError> {
        let host = Host {
            conn,
            name: display_name.trim().to_string(),
            account,
        };
        let (code, _session, player) = self.inner.registry.create(host, &self.inner.rules)?;
        self.inner.notifier.join_room(&code, conn);
        info!(code = %code, %conn, "Lobby created");
        Ok((code, player))
    }

    /// Adds `conn` to an open lobby and announces them to the room.
    #[instrument(skip(self, account))]
    pub fn join_lobby(
        &self,
        conn: ConnId,
        code: &LobbyCode,
        display_name: String,
        account: Option<AccountRef>,
    ) -> Result<(PlayerSummary, Vec<PlayerSummary>), GameError> {
        let session = self.inner.registry.get(code)?;
        let mut game = lock_session(&session);
        let player = game.add_player(conn, display_name.trim().to_string(), account)?;
        self.inner.notifier.join_room(code, conn);
        self.inner.notifier.notify(
            GameEvent::PlayerJoined {
                player: player.clone(),
            },
            Target::Room(code.clone()),
        );
        Ok((player, game.roster()))
    }

    /// Starts the game, deals opening tiles and begins the first turn.
    #[instrument(skip(self))]
    pub async fn start_game(&self, conn: ConnId, code: &LobbyCode) -> Result<(), GameError> {
        let session = self.inner.registry.get(code)?;
        let game_over = {
            let mut game = lock_session(&session);
            let started = game.start(conn, Utc::now())?;

            let room = Target::Room(code.clone());
            for (player, letter) in &started.dealt {
                self.inner.notifier.notify(
                    GameEvent::TileFlipped {
                        player: *player,
                        letter: *letter,
                        tiles_left: game.bag().len(),
                    },
                    room.clone(),
                );
            }
            self.inner.notifier.notify(
                GameEvent::GameStarted {
                    turn_order: game.roster(),
                },
                room,
            );
            self.apply_turn_change(code, started.change)
        };
        self.finish_if_over(game_over).await;
        Ok(())
    }

    /// Draws a tile for the current player.
    #[instrument(skip(self))]
    pub async fn draw_tile(&self, conn: ConnId, code: &LobbyCode) -> Result<char, GameError> {
        let session = self.inner.registry.get(code)?;
        let (letter, game_over) = {
            let mut game = lock_session(&session);
            let drawn = game.draw_tile(conn, Utc::now())?;
            self.inner.notifier.notify(
                GameEvent::TileFlipped {
                    player: conn,
                    letter: drawn.letter,
                    tiles_left: drawn.tiles_left,
                },
                Target::Room(code.clone()),
            );
            (drawn.letter, self.apply_turn_change(code, drawn.change))
        };
        self.finish_if_over(game_over).await;
        Ok(letter)
    }

    /// Places a word from the current player's tiles.
    #[instrument(skip(self))]
    pub async fn place_word(
        &self,
        conn: ConnId,
        code: &LobbyCode,
        word: &str,
        tiles: &[char],
    ) -> Result<PlacedWord, GameError> {
        let session = self.inner.registry.get(code)?;
        let (placed, game_over) = {
            let mut game = lock_session(&session);
            let placement =
                game.place_word(conn, word, tiles, self.inner.dictionary.as_ref(), Utc::now())?;
            self.inner.notifier.notify(
                GameEvent::WordPlaced {
                    player: conn,
                    word_id: placement.word.id().clone(),
                    word: placement.word.text().clone(),
                },
                Target::Room(code.clone()),
            );
            let over = self.apply_turn_change(code, placement.change);
            (placement.word, over)
        };
        self.finish_if_over(game_over).await;
        Ok(placed)
    }

    /// Steals a word for the current player.
    #[instrument(skip(self))]
    pub async fn steal_word(
        &self,
        conn: ConnId,
        code: &LobbyCode,
        victim: ConnId,
        base_word_id: &WordId,
        proposed: &str,
    ) -> Result<PlacedWord, GameError> {
        let session = self.inner.registry.get(code)?;
        let (stolen, game_over) = {
            let mut game = lock_session(&session);
            let steal = game.steal_word(
                conn,
                victim,
                base_word_id,
                proposed,
                self.inner.dictionary.as_ref(),
                Utc::now(),
            )?;
            self.inner.notifier.notify(
                GameEvent::WordStolen {
                    thief: conn,
                    victim: steal.victim,
                    old_word_id: steal.old_word_id.clone(),
                    new_word_id: steal.word.id().clone(),
                    new_word: steal.word.text().clone(),
                },
                Target::Room(code.clone()),
            );
            let over = self.apply_turn_change(code, steal.change);
            (steal.word, over)
        };
        self.finish_if_over(game_over).await;
        Ok(stolen)
    }

    /// Broadcasts a chat line from a lobby member.
    #[instrument(skip(self, text))]
    pub fn chat(&self, conn: ConnId, code: &LobbyCode, text: &str) -> Result<(), GameError> {
        let session = self.inner.registry.get(code)?;
        let game = lock_session(&session);
        let hand = game
            .hand(conn)
            .ok_or(GameError::PlayerNotFound { player: conn })?;
        self.inner.notifier.notify(
            GameEvent::ChatMessage {
                player: conn,
                name: hand.name().clone(),
                text: text.trim().to_string(),
            },
            Target::Room(code.clone()),
        );
        Ok(())
    }

    /// Removes a closed connection from every session it belongs to.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, conn: ConnId) {
        for (code, session) in self.inner.registry.sessions() {
            let (game_over, lobby_closed) = {
                let mut game = lock_session(&session);
                let Some(departure) = game.remove_player(conn, Utc::now()) else {
                    continue;
                };
                self.inner.notifier.leave_room(&code, conn);
                self.inner.notifier.notify(
                    GameEvent::PlayerLeft {
                        player: conn,
                        name: departure.player.name.clone(),
                    },
                    Target::Room(code.clone()),
                );
                let over = departure
                    .change
                    .and_then(|change| self.apply_turn_change(&code, change));
                (over, departure.lobby_closed)
            };

            if lobby_closed {
                info!(code = %code, "Lobby dropped below two players before starting");
                self.inner.registry.remove(&code);
                self.inner.notifier.notify(
                    GameEvent::LobbyClosed { code: code.clone() },
                    Target::Room(code.clone()),
                );
                self.inner.notifier.close_room(&code);
            }
            self.finish_if_over(game_over).await;
        }
    }

    /// Runs a fired turn timer. Stale tickets do nothing.
    #[instrument(skip(self))]
    pub async fn handle_timeout(&self, code: &LobbyCode, ticket: TurnTicket) {
        let game_over = self.expire_turn(code, ticket);
        self.finish_if_over(game_over).await;
    }

    #[instrument(skip(self))]
    fn expire_turn(&self, code: &LobbyCode, ticket: TurnTicket) -> Option<MatchSummary> {
        let session = self.inner.registry.get(code).ok()?;
        let mut game = lock_session(&session);
        let expired = game.expire_turn(ticket, Utc::now())?;
        self.inner.notifier.notify(
            GameEvent::TurnTimeout {
                player: expired.player,
            },
            Target::Room(code.clone()),
        );
        self.apply_turn_change(code, expired.change)
    }

    /// Notifies the next player and arms their timer, or hands back the
    /// summary of a game that just ended.
    #[instrument(skip(self, change))]
    fn apply_turn_change(&self, code: &LobbyCode, change: TurnChange) -> Option<MatchSummary> {
        match change {
            TurnChange::Next { player, ticket } => {
                self.inner.notifier.notify(
                    GameEvent::YourTurn {
                        turn_index: ticket.turn_index,
                        timeout_secs: self.inner.rules.turn_timeout().as_secs(),
                    },
                    Target::Connection(player),
                );
                self.schedule_timeout(code.clone(), ticket);
                None
            }
            TurnChange::GameOver(summary) => Some(summary),
        }
    }

    #[instrument(skip(self))]
    fn schedule_timeout(&self, code: LobbyCode, ticket: TurnTicket) {
        let service = self.clone();
        let delay = *self.inner.rules.turn_timeout();
        debug!(code = %code, ?ticket, ?delay, "Arming turn timer");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            service.handle_timeout(&code, ticket).await;
        });
    }

    #[instrument(skip(self, game_over), fields(ended = game_over.is_some()))]
    async fn finish_if_over(&self, game_over: Option<MatchSummary>) {
        if let Some(summary) = game_over {
            self.finish_game(summary).await;
        }
    }

    /// Persists results (best effort), announces them, and drops the session.
    #[instrument(skip(self, summary), fields(code = %summary.code()))]
    async fn finish_game(&self, summary: MatchSummary) {
        let code = summary.code().clone();
        info!(players = summary.standings().len(), "Game over");

        match self.inner.store.save_match(&summary).await {
            Ok(match_id) => debug!(match_id, "Match saved"),
            Err(err) => {
                let err = GameError::from(err);
                error!(error = %err, "Failed to save match results");
            }
        }

        self.inner.notifier.notify(
            GameEvent::GameOver {
                results: summary.results(),
            },
            Target::Room(code.clone()),
        );
        self.inner.registry.remove(&code);
        self.inner.notifier.close_room(&code);
    }
}
