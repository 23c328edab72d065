//! Match history persistence.

mod error;
mod models;
mod repository;
mod schema;
mod store;

pub use error::{DbError, DbErrorKind};
pub use models::{
    MatchPlayerRecord, MatchRecord, NewMatch, NewMatchPlayer, NewWordPlayed, WordPlayedRecord,
};
pub use repository::MatchRepository;
pub use store::MatchStore;
