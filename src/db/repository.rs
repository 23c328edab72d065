//! Match history repository.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{
    DbError, DbErrorKind, MatchPlayerRecord, MatchRecord, NewMatch, NewMatchPlayer, NewWordPlayed,
    WordPlayedRecord, schema,
};
use crate::game::{MatchSummary, word_score};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// SQLite-backed store of finished matches.
#[derive(Debug, Clone)]
pub struct MatchRepository {
    db_path: String,
}

impl MatchRepository {
    /// Creates a repository for the database at `db_path` without touching it.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new(DbErrorKind::InvalidPath, "Database path is empty"));
        }
        info!("Creating MatchRepository");
        Ok(Self { db_path })
    }

    /// Creates a repository and applies pending migrations.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn open(db_path: String) -> Result<Self, DbError> {
        let repo = Self::new(db_path)?;
        let applied = repo.run_migrations()?;
        info!(applied, "Database ready");
        Ok(repo)
    }

    /// Path of the database file.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| {
                DbError::new(
                    DbErrorKind::Connection,
                    format!("Failed to connect to '{}': {}", self.db_path, e),
                )
            })
    }

    /// Applies pending schema migrations, returning how many ran.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| {
                DbError::new(DbErrorKind::Migration, format!("Migrations failed: {}", e))
            })?;
        Ok(applied.len())
    }

    /// Writes a finished match, its ranked players and their final words.
    ///
    /// Everything is written in one transaction; player rows are inserted in
    /// rank order so ascending ids reproduce the ranking.
    #[instrument(skip(self, summary), fields(code = %summary.code()))]
    pub fn record_match(&self, summary: &MatchSummary) -> Result<MatchRecord, DbError> {
        let mut conn = self.connection()?;

        let record = conn.transaction::<_, DbError, _>(|conn| {
            let new_match = NewMatch::new(
                summary.code().to_string(),
                summary.created_at().naive_utc(),
                Some(summary.ended_at().naive_utc()),
            );
            let record = diesel::insert_into(schema::matches::table)
                .values(&new_match)
                .returning(MatchRecord::as_returning())
                .get_result(conn)?;

            for standing in summary.standings() {
                let new_player = NewMatchPlayer::new(
                    *record.id(),
                    standing.account().as_ref().map(|account| account.0),
                    standing.name().clone(),
                    *standing.score() as i32,
                );
                let player = diesel::insert_into(schema::match_players::table)
                    .values(&new_player)
                    .returning(MatchPlayerRecord::as_returning())
                    .get_result(conn)?;

                let words: Vec<NewWordPlayed> = standing
                    .words()
                    .iter()
                    .map(|word| {
                        NewWordPlayed::new(
                            *record.id(),
                            *player.id(),
                            word.text().clone(),
                            word_score(word) as i32,
                            *word.stolen(),
                        )
                    })
                    .collect();
                if !words.is_empty() {
                    diesel::insert_into(schema::words_played::table)
                        .values(&words)
                        .execute(conn)?;
                }
            }
            Ok(record)
        })?;

        info!(
            match_id = record.id(),
            players = summary.standings().len(),
            "Match recorded"
        );
        Ok(record)
    }

    /// Most recently ended matches first.
    #[instrument(skip(self))]
    pub fn recent_matches(&self, limit: i64) -> Result<Vec<MatchRecord>, DbError> {
        let mut conn = self.connection()?;
        let matches = schema::matches::table
            .order((schema::matches::ended_at.desc(), schema::matches::id.desc()))
            .limit(limit)
            .select(MatchRecord::as_select())
            .load(&mut conn)?;
        debug!(count = matches.len(), "Recent matches loaded");
        Ok(matches)
    }

    /// Players of a match in rank order.
    #[instrument(skip(self))]
    pub fn match_players(&self, match_id: i32) -> Result<Vec<MatchPlayerRecord>, DbError> {
        let mut conn = self.connection()?;
        let players = schema::match_players::table
            .filter(schema::match_players::match_id.eq(match_id))
            .order(schema::match_players::id.asc())
            .select(MatchPlayerRecord::as_select())
            .load(&mut conn)?;
        Ok(players)
    }

    /// Final words of one match player.
    #[instrument(skip(self))]
    pub fn words_for_player(&self, player_id: i32) -> Result<Vec<WordPlayedRecord>, DbError> {
        let mut conn = self.connection()?;
        let words = schema::words_played::table
            .filter(schema::words_played::player_id.eq(player_id))
            .order(schema::words_played::id.asc())
            .select(WordPlayedRecord::as_select())
            .load(&mut conn)?;
        Ok(words)
    }
}
