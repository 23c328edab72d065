//! End-of-game scoring and ranking.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

use super::hand::{AccountRef, ConnId, PlacedWord, PlayerHand};
use crate::code::LobbyCode;

/// Points for one placed word: its length squared.
pub fn word_score(word: &PlacedWord) -> u32 {
    let len = word.len() as u32;
    len * len
}

/// One player's final result.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Standing {
    player: ConnId,
    name: String,
    account: Option<AccountRef>,
    score: u32,
    words: Vec<PlacedWord>,
}

impl Standing {
    /// Scores a hand.
    pub fn from_hand(hand: &PlayerHand) -> Self {
        let words: Vec<PlacedWord> = hand.words().values().cloned().collect();
        Self {
            player: *hand.conn(),
            name: hand.name().clone(),
            account: *hand.account(),
            score: words.iter().map(word_score).sum(),
            words,
        }
    }

    /// Name and score, as broadcast to players.
    pub fn final_score(&self) -> FinalScore {
        FinalScore {
            name: self.name.clone(),
            score: self.score,
        }
    }
}

/// Ranks hands by score, highest first.
///
/// The sort is stable: players with equal scores keep the order in which
/// `hands` yielded them. No other tie-break is applied.
pub fn rank_standings<'a>(hands: impl IntoIterator<Item = &'a PlayerHand>) -> Vec<Standing> {
    let mut standings: Vec<Standing> = hands.into_iter().map(Standing::from_hand).collect();
    standings.sort_by(|a, b| b.score.cmp(&a.score));
    standings
}

/// Name and score pair in the game-over broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    /// Display name.
    pub name: String,
    /// Sum of squared word lengths.
    pub score: u32,
}

/// Everything needed to persist and announce a finished game.
#[derive(Debug, Clone, Getters)]
pub struct MatchSummary {
    code: LobbyCode,
    created_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    standings: Vec<Standing>,
}

impl MatchSummary {
    /// Creates a summary from ranked standings.
    pub fn new(
        code: LobbyCode,
        created_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        standings: Vec<Standing>,
    ) -> Self {
        Self {
            code,
            created_at,
            ended_at,
            standings,
        }
    }

    /// Ranked name/score list for the game-over broadcast.
    pub fn results(&self) -> Vec<FinalScore> {
        self.standings.iter().map(Standing::final_score).collect()
    }
}
