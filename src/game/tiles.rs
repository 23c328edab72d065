//! Letter multisets and the shared tile bag.

use std::collections::BTreeMap;

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::GameError;

/// Letter counts of the classic 144-tile set.
pub const TILE_DISTRIBUTION: [(char, u32); 26] = [
    ('A', 13),
    ('B', 3),
    ('C', 3),
    ('D', 6),
    ('E', 18),
    ('F', 3),
    ('G', 4),
    ('H', 3),
    ('I', 12),
    ('J', 2),
    ('K', 2),
    ('L', 5),
    ('M', 3),
    ('N', 8),
    ('O', 11),
    ('P', 3),
    ('Q', 2),
    ('R', 9),
    ('S', 6),
    ('T', 9),
    ('U', 6),
    ('V', 3),
    ('W', 3),
    ('X', 2),
    ('Y', 3),
    ('Z', 2),
];

/// Total number of tiles in a fresh bag.
pub const TOTAL_TILES: usize = 144;

/// A multiset of letters: letter -> remaining count.
///
/// Zero counts are never stored, so two multisets holding the same letters
/// compare equal regardless of how they were built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterCounts {
    counts: BTreeMap<char, u32>,
}

impl LetterCounts {
    /// Creates an empty multiset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `letter`.
    pub fn add(&mut self, letter: char) {
        *self.counts.entry(letter).or_insert(0) += 1;
    }

    /// Removes one occurrence of `letter`, returning whether it was present.
    pub fn remove(&mut self, letter: char) -> bool {
        match self.counts.get_mut(&letter) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.counts.remove(&letter);
                true
            }
            None => false,
        }
    }

    /// Number of occurrences of `letter`.
    pub fn count(&self, letter: char) -> u32 {
        self.counts.get(&letter).copied().unwrap_or(0)
    }

    /// Total number of letters held.
    pub fn len(&self) -> usize {
        self.counts.values().map(|c| *c as usize).sum()
    }

    /// Whether no letters are held.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Returns a copy with one occurrence of each of `letters` consumed.
    ///
    /// Letters are consumed in order; the first one that cannot be supplied
    /// is returned as the error and `self` is never touched.
    pub fn take_all(&self, letters: &[char]) -> Result<LetterCounts, char> {
        let mut working = self.clone();
        for &letter in letters {
            if !working.remove(letter) {
                return Err(letter);
            }
        }
        Ok(working)
    }

    /// Whether every letter of `letters` (with multiplicity) is held.
    pub fn contains_all(&self, letters: &[char]) -> bool {
        self.take_all(letters).is_ok()
    }

    /// All held letters in alphabetical order, repeated by count.
    pub fn letters(&self) -> Vec<char> {
        self.counts
            .iter()
            .flat_map(|(letter, count)| std::iter::repeat_n(*letter, *count as usize))
            .collect()
    }
}

impl FromIterator<char> for LetterCounts {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        let mut counts = Self::new();
        for letter in iter {
            counts.add(letter);
        }
        counts
    }
}

/// Shuffled pool of undrawn tiles for one session.
#[derive(Debug, Clone)]
pub struct TileBag {
    tiles: Vec<char>,
}

impl TileBag {
    /// Fills a bag from [`TILE_DISTRIBUTION`] and shuffles it with the OS RNG.
    #[instrument]
    pub fn shuffled() -> Self {
        let mut tiles: Vec<char> = TILE_DISTRIBUTION
            .iter()
            .flat_map(|(letter, count)| std::iter::repeat_n(*letter, *count as usize))
            .collect();
        tiles.shuffle(&mut OsRng);
        debug!(tiles = tiles.len(), "Tile bag shuffled");
        Self { tiles }
    }

    /// Builds a full, unshuffled bag whose first draws are `top`, in order.
    ///
    /// The remaining tiles follow in alphabetical order. Fails with the first
    /// letter of `top` the distribution cannot supply.
    pub fn stacked(top: &[char]) -> Result<Self, char> {
        let full: LetterCounts = TILE_DISTRIBUTION
            .iter()
            .flat_map(|(letter, count)| std::iter::repeat_n(*letter, *count as usize))
            .collect();
        let rest = full.take_all(top)?;
        let mut tiles = rest.letters();
        tiles.reverse();
        tiles.extend(top.iter().rev());
        Ok(Self { tiles })
    }

    /// Draws the next tile.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EmptyBag`] when the bag is exhausted.
    pub fn draw(&mut self) -> Result<char, GameError> {
        self.tiles.pop().ok_or(GameError::EmptyBag)
    }

    /// Tiles left in the bag.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the bag is exhausted.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Remaining tiles as a multiset.
    pub fn remaining(&self) -> LetterCounts {
        self.tiles.iter().copied().collect()
    }
}
