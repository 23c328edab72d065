//! Word-stealing game core: tiles, hands, turns, ledger and scoring.

mod hand;
mod ledger;
mod scoring;
mod session;
mod tiles;
mod turns;

pub use hand::{AccountRef, ConnId, PlacedWord, PlayerHand, PlayerSummary, WordId};
pub use ledger::{MAX_WORD_LEN, Placement, Steal, added_letters, normalize_word};
pub use scoring::{FinalScore, MatchSummary, Standing, rank_standings, word_score};
pub use session::{Departure, Drawn, Expired, GameSession, Started, TurnChange};
pub use tiles::{LetterCounts, TILE_DISTRIBUTION, TOTAL_TILES, TileBag};
pub use turns::{MIN_PLAYERS, Phase, Removal, TurnScheduler, TurnStep, TurnTicket};
