//! Word placement and steals.
//!
//! Both operations validate against working copies of the actor's letters
//! and commit only after every check, including the dictionary, has passed.
//! A rejected request leaves the session exactly as it was and does not
//! advance the turn.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use super::hand::{ConnId, PlacedWord, WordId};
use super::session::{GameSession, TurnChange};
use super::tiles::LetterCounts;
use crate::dictionary::Dictionary;
use crate::error::GameError;

/// Longest word a player may place or propose.
pub const MAX_WORD_LEN: usize = 32;

/// Uppercases a word and checks it is 1..=[`MAX_WORD_LEN`] ASCII letters.
///
/// # Errors
///
/// [`GameError::InvalidWord`] for empty, overlong or non-alphabetic input.
pub fn normalize_word(raw: &str) -> Result<String, GameError> {
    let word = raw.trim().to_ascii_uppercase();
    if word.is_empty()
        || word.len() > MAX_WORD_LEN
        || !word.chars().all(|ch| ch.is_ascii_uppercase())
    {
        return Err(GameError::InvalidWord { word });
    }
    Ok(word)
}

/// Letters the thief must contribute to turn `base` into `proposed`.
///
/// Each base letter cancels one matching letter of the proposed word, by
/// value rather than position; what is left over must come from the thief.
///
/// # Errors
///
/// [`GameError::InvalidSteal`] when the proposed word lacks one of the base
/// letters, or adds nothing (a pure rearrangement).
#[instrument]
pub fn added_letters(base: &str, proposed: &str) -> Result<Vec<char>, GameError> {
    let invalid = || GameError::InvalidSteal {
        base: base.to_string(),
        proposed: proposed.to_string(),
    };
    let mut remaining: Vec<char> = proposed.chars().collect();
    for letter in base.chars() {
        let position = remaining.iter().position(|c| *c == letter).ok_or_else(invalid)?;
        remaining.remove(position);
    }
    if remaining.is_empty() {
        return Err(invalid());
    }
    Ok(remaining)
}

/// Outcome of placing a word.
#[derive(Debug, Clone)]
pub struct Placement {
    /// The newly placed word.
    pub word: PlacedWord,
    /// Turn after the placement.
    pub change: TurnChange,
}

/// Outcome of a steal.
#[derive(Debug, Clone)]
pub struct Steal {
    /// Player who lost the base word.
    pub victim: ConnId,
    /// Id the base word had under the victim.
    pub old_word_id: WordId,
    /// Letters the thief contributed.
    pub added: Vec<char>,
    /// The new word, now owned by the thief.
    pub word: PlacedWord,
    /// Turn after the steal.
    pub change: TurnChange,
}

impl GameSession {
    /// Places a word built from the actor's own tiles.
    ///
    /// `tiles` must be exactly the letters of `word`, in any order.
    ///
    /// # Errors
    ///
    /// [`GameError::NotYourTurn`], [`GameError::InvalidWord`],
    /// [`GameError::TilesUnavailable`], [`GameError::TilesMismatch`].
    #[instrument(skip(self, dictionary, now), fields(code = %self.code()))]
    pub fn place_word(
        &mut self,
        actor: ConnId,
        word: &str,
        tiles: &[char],
        dictionary: &dyn Dictionary,
        now: DateTime<Utc>,
    ) -> Result<Placement, GameError> {
        self.require_turn(actor)?;
        let word = normalize_word(word)?;
        let tiles: Vec<char> = tiles.iter().map(char::to_ascii_uppercase).collect();

        let hand = self
            .players
            .get(&actor)
            .ok_or(GameError::PlayerNotFound { player: actor })?;
        let remaining = hand.letters().take_all(&tiles).map_err(|letter| {
            warn!(player = %actor, %letter, "Placement tiles unavailable");
            GameError::TilesUnavailable { letter }
        })?;

        let spelled: LetterCounts = word.chars().collect();
        let claimed: LetterCounts = tiles.iter().copied().collect();
        if spelled != claimed {
            warn!(player = %actor, %word, "Placement tiles do not spell word");
            return Err(GameError::TilesMismatch { word });
        }

        if !dictionary.is_valid_word(&word) {
            warn!(player = %actor, %word, "Dictionary rejected word");
            return Err(GameError::InvalidWord { word });
        }

        let placed = PlacedWord::new(self.fresh_word_id(), word, false);
        if let Some(hand) = self.players.get_mut(&actor) {
            hand.commit_letters(remaining);
            hand.record_word(placed.clone());
        }
        info!(player = %actor, word = %placed.text(), word_id = %placed.id(), "Word placed");

        let step = self.turns.advance(true, now)?;
        Ok(Placement {
            word: placed,
            change: self.turn_change(step, now),
        })
    }

    /// Steals `victim`'s word `base_word_id` by extending it to `proposed`.
    ///
    /// # Errors
    ///
    /// [`GameError::NotYourTurn`], [`GameError::PlayerNotFound`],
    /// [`GameError::WordNotFound`], [`GameError::InvalidWord`],
    /// [`GameError::InvalidSteal`], [`GameError::TilesUnavailable`].
    #[instrument(skip(self, dictionary, now), fields(code = %self.code()))]
    pub fn steal_word(
        &mut self,
        thief: ConnId,
        victim: ConnId,
        base_word_id: &WordId,
        proposed: &str,
        dictionary: &dyn Dictionary,
        now: DateTime<Utc>,
    ) -> Result<Steal, GameError> {
        self.require_turn(thief)?;

        let base = self
            .players
            .get(&victim)
            .ok_or(GameError::PlayerNotFound { player: victim })?
            .word(base_word_id)
            .ok_or_else(|| GameError::WordNotFound {
                player: victim,
                word_id: base_word_id.clone(),
            })?
            .text()
            .clone();

        let proposed = normalize_word(proposed)?;
        let added = added_letters(&base, &proposed)?;

        let thief_hand = self
            .players
            .get(&thief)
            .ok_or(GameError::PlayerNotFound { player: thief })?;
        let remaining = thief_hand.letters().take_all(&added).map_err(|letter| {
            warn!(player = %thief, %letter, "Steal tiles unavailable");
            GameError::TilesUnavailable { letter }
        })?;

        if !dictionary.is_valid_word(&proposed) {
            warn!(player = %thief, word = %proposed, "Dictionary rejected steal");
            return Err(GameError::InvalidWord { word: proposed });
        }

        let new_id = self.fresh_word_id();
        if let Some(victim_hand) = self.players.get_mut(&victim) {
            victim_hand.release_word(base_word_id);
        }
        let word = PlacedWord::new(new_id, proposed, true);
        if let Some(thief_hand) = self.players.get_mut(&thief) {
            thief_hand.commit_letters(remaining);
            thief_hand.record_word(word.clone());
        }
        info!(
            thief = %thief,
            victim = %victim,
            base = %base,
            word = %word.text(),
            "Word stolen"
        );

        let step = self.turns.advance(true, now)?;
        Ok(Steal {
            victim,
            old_word_id: base_word_id.clone(),
            added,
            word,
            change: self.turn_change(step, now),
        })
    }
}
