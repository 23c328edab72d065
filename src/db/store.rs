//! Persistence capability the game engine calls at the end of a match.

use async_trait::async_trait;

use crate::db::{DbError, MatchRepository};
use crate::game::MatchSummary;

/// Stores finished matches.
///
/// Failures are reported to the caller, which treats storage as best effort.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Saves a finished match with its ranked players, returning its id.
    async fn save_match(&self, summary: &MatchSummary) -> Result<i32, DbError>;
}

#[async_trait]
impl MatchStore for MatchRepository {
    async fn save_match(&self, summary: &MatchSummary) -> Result<i32, DbError> {
        let repo = self.clone();
        let summary = summary.clone();
        let record = tokio::task::spawn_blocking(move || repo.record_match(&summary)).await??;
        Ok(*record.id())
    }
}
