//! Lobby codes and their generation.

use std::fmt;

use rand::Rng;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Number of characters in a lobby code.
pub const LOBBY_CODE_LEN: usize = 5;

/// Characters a lobby code is drawn from.
pub const LOBBY_CODE_ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Short code players type to join a lobby.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LobbyCode(String);

impl LobbyCode {
    /// Parses a lobby code, accepting lowercase input.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidRequest`] unless the value is exactly
    /// [`LOBBY_CODE_LEN`] ASCII letters.
    pub fn parse(value: &str) -> Result<Self, GameError> {
        let value = value.trim();
        if value.len() != LOBBY_CODE_LEN {
            return Err(GameError::invalid_request(format!(
                "lobby code must be {LOBBY_CODE_LEN} letters, got {}",
                value.len()
            )));
        }
        if let Some(ch) = value.chars().find(|ch| !ch.is_ascii_alphabetic()) {
            return Err(GameError::invalid_request(format!(
                "invalid character '{ch}' in lobby code"
            )));
        }
        Ok(Self(value.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LobbyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for LobbyCode {
    type Err = GameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for LobbyCode {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LobbyCode> for String {
    fn from(code: LobbyCode) -> Self {
        code.0
    }
}

/// Source of candidate lobby codes.
pub trait CodeGenerator: Send + Sync {
    /// Produces the next candidate code. Collisions are handled by the caller.
    fn generate(&self) -> LobbyCode;
}

/// Uniformly random codes from the operating system RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodes;

impl CodeGenerator for RandomCodes {
    fn generate(&self) -> LobbyCode {
        let mut rng = OsRng;
        let code = (0..LOBBY_CODE_LEN)
            .map(|_| char::from(LOBBY_CODE_ALPHABET[rng.gen_range(0..LOBBY_CODE_ALPHABET.len())]))
            .collect();
        LobbyCode(code)
    }
}
