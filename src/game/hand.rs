//! Player hands and the words they own.

use std::collections::BTreeMap;
use std::fmt;

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

use super::tiles::LetterCounts;

/// Identity of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opaque reference to an authenticated account, supplied by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountRef(pub i32);

/// Identifier of a placed word, unique within its session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordId(pub String);

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A word committed to the shared board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct PlacedWord {
    id: WordId,
    text: String,
    stolen: bool,
}

impl PlacedWord {
    /// Creates a placed word. `stolen` marks words obtained by a steal.
    pub fn new(id: WordId, text: String, stolen: bool) -> Self {
        Self { id, text, stolen }
    }

    /// Number of letter tiles in the word.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the word has no letters.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Public view of a player, as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Connection id, used as the player id on the wire.
    pub id: ConnId,
    /// Display name.
    pub name: String,
}

/// A player's held letters and placed words.
#[derive(Debug, Clone, Getters)]
pub struct PlayerHand {
    conn: ConnId,
    name: String,
    account: Option<AccountRef>,
    letters: LetterCounts,
    words: BTreeMap<WordId, PlacedWord>,
}

impl PlayerHand {
    /// Creates an empty hand for a newly joined player.
    pub fn new(conn: ConnId, name: String, account: Option<AccountRef>) -> Self {
        Self {
            conn,
            name,
            account,
            letters: LetterCounts::new(),
            words: BTreeMap::new(),
        }
    }

    /// Public summary of this player.
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.conn,
            name: self.name.clone(),
        }
    }

    /// Adds a drawn tile to the hand.
    pub fn receive(&mut self, letter: char) {
        self.letters.add(letter);
    }

    /// Replaces the held letters with an already validated working copy.
    pub(crate) fn commit_letters(&mut self, letters: LetterCounts) {
        self.letters = letters;
    }

    /// Records a word as owned by this player.
    pub(crate) fn record_word(&mut self, word: PlacedWord) {
        self.words.insert(word.id().clone(), word);
    }

    /// Removes and returns an owned word.
    pub(crate) fn release_word(&mut self, id: &WordId) -> Option<PlacedWord> {
        self.words.remove(id)
    }

    /// Looks up an owned word.
    pub fn word(&self, id: &WordId) -> Option<&PlacedWord> {
        self.words.get(id)
    }

    /// Tiles tied up in this hand: held letters plus placed word letters.
    pub fn tile_count(&self) -> usize {
        self.letters.len() + self.words.values().map(PlacedWord::len).sum::<usize>()
    }
}
