//! Registry of live sessions keyed by lobby code.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::code::{CodeGenerator, LobbyCode, RandomCodes};
use crate::config::GameRules;
use crate::error::GameError;
use crate::game::{AccountRef, ConnId, GameSession, PlayerSummary};

/// A session shared between handlers and timers.
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Locks a session, recovering the guard if a previous holder panicked.
pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, GameSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Player opening a lobby.
#[derive(Debug, Clone)]
pub struct Host {
    /// Connection opening the lobby.
    pub conn: ConnId,
    /// Display name.
    pub name: String,
    /// Authenticated account, if any.
    pub account: Option<AccountRef>,
}

/// Maps lobby codes to live sessions.
///
/// Insert, lookup and removal each happen under a single lock, so a code is
/// never visible before its session is fully built.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<LobbyCode, SharedSession>>>,
    codes: Arc<dyn CodeGenerator>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .finish()
    }
}

impl SessionRegistry {
    /// Creates an empty registry with random lobby codes.
    #[instrument]
    pub fn new() -> Self {
        Self::with_codes(Arc::new(RandomCodes))
    }

    /// Creates an empty registry drawing codes from `codes`.
    #[instrument(skip(codes))]
    pub fn with_codes(codes: Arc<dyn CodeGenerator>) -> Self {
        info!("Creating session registry");
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            codes,
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<LobbyCode, SharedSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a lobby with `host` as its first player.
    ///
    /// Tries up to `rules.code_attempts()` codes; the session is built and
    /// inserted before the lock is released.
    ///
    /// # Errors
    ///
    /// [`GameError::CodeGenerationExhausted`] if every attempt collided.
    #[instrument(skip(self, host, rules), fields(conn = %host.conn))]
    pub fn create(
        &self,
        host: Host,
        rules: &GameRules,
    ) -> Result<(LobbyCode, SharedSession, PlayerSummary), GameError> {
        let mut sessions = self.map();
        let attempts = *rules.code_attempts();

        let code = (0..attempts)
            .map(|_| self.codes.generate())
            .find(|candidate| {
                let taken = sessions.contains_key(candidate);
                if taken {
                    debug!(code = %candidate, "Lobby code collision");
                }
                !taken
            })
            .ok_or_else(|| {
                warn!(attempts, "Lobby code generation exhausted");
                GameError::CodeGenerationExhausted { attempts }
            })?;

        let mut session = GameSession::new(code.clone(), rules, Utc::now());
        let player = session.add_player(host.conn, host.name, host.account)?;
        let shared = Arc::new(Mutex::new(session));
        sessions.insert(code.clone(), shared.clone());

        info!(code = %code, "Lobby opened");
        Ok((code, shared, player))
    }

    /// Inserts an already built session under its own code.
    ///
    /// # Errors
    ///
    /// Hands the session back untouched if its code is already live.
    #[instrument(skip(self, session), fields(code = %session.code()))]
    pub fn insert(&self, session: GameSession) -> Result<SharedSession, GameSession> {
        let mut sessions = self.map();
        let code = session.code().clone();
        if sessions.contains_key(&code) {
            warn!("Lobby code already live");
            return Err(session);
        }
        let shared = Arc::new(Mutex::new(session));
        sessions.insert(code, shared.clone());
        Ok(shared)
    }

    /// Looks up a live session.
    ///
    /// # Errors
    ///
    /// [`GameError::LobbyNotFound`] if no session has this code.
    #[instrument(skip(self))]
    pub fn get(&self, code: &LobbyCode) -> Result<SharedSession, GameError> {
        self.map().get(code).cloned().ok_or_else(|| {
            debug!(code = %code, "Session not found");
            GameError::LobbyNotFound { code: code.clone() }
        })
    }

    /// Removes a session. Removing an absent code is a no-op.
    #[instrument(skip(self))]
    pub fn remove(&self, code: &LobbyCode) -> Option<SharedSession> {
        let removed = self.map().remove(code);
        if removed.is_some() {
            info!(code = %code, "Session removed");
        }
        removed
    }

    /// Whether a session with this code is live.
    pub fn contains(&self, code: &LobbyCode) -> bool {
        self.map().contains_key(code)
    }

    /// Snapshot of all live sessions.
    #[instrument(skip(self))]
    pub fn sessions(&self) -> Vec<(LobbyCode, SharedSession)> {
        self.map()
            .iter()
            .map(|(code, session)| (code.clone(), session.clone()))
            .collect()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
