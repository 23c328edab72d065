//! Database models for finished matches.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema;

/// A finished match.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::matches)]
pub struct MatchRecord {
    id: i32,
    code: String,
    created_at: NaiveDateTime,
    ended_at: Option<NaiveDateTime>,
}

/// Insertable match row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::matches)]
pub struct NewMatch {
    code: String,
    created_at: NaiveDateTime,
    ended_at: Option<NaiveDateTime>,
}

/// One player's result in a match. Rows are stored in rank order.
#[derive(
    Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters, Serialize,
)]
#[diesel(table_name = schema::match_players)]
#[diesel(belongs_to(MatchRecord, foreign_key = match_id))]
pub struct MatchPlayerRecord {
    id: i32,
    match_id: i32,
    user_id: Option<i32>,
    name: String,
    score: i32,
}

/// Insertable match player row.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::match_players)]
pub struct NewMatchPlayer {
    match_id: i32,
    user_id: Option<i32>,
    name: String,
    score: i32,
}

/// A word a player held when the match ended.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::words_played)]
pub struct WordPlayedRecord {
    id: i32,
    match_id: i32,
    player_id: i32,
    word: String,
    points: i32,
    was_stolen: bool,
}

/// Insertable word row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::words_played)]
pub struct NewWordPlayed {
    match_id: i32,
    player_id: i32,
    word: String,
    points: i32,
    was_stolen: bool,
}
