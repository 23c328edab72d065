//! Persistence error type.

use derive_more::{Display, Error};

/// Which storage step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DbErrorKind {
    /// The configured database path is unusable.
    InvalidPath,
    /// Opening the SQLite file failed.
    Connection,
    /// Applying embedded migrations failed.
    Migration,
    /// A statement or transaction failed.
    Query,
    /// The blocking storage task panicked or was cancelled.
    Task,
}

/// Storage failure tagged with the step and the source location that raised it.
#[derive(Debug, Clone, Display, Error)]
#[display("Database {kind} failure: {message} at {file}:{line}")]
pub struct DbError {
    /// Failed step.
    pub kind: DbErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DbError {
    /// Creates an error at the caller's location.
    #[track_caller]
    pub fn new(kind: DbErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(DbErrorKind::Query, err.to_string())
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(DbErrorKind::Connection, err.to_string())
    }
}

impl From<tokio::task::JoinError> for DbError {
    #[track_caller]
    fn from(err: tokio::task::JoinError) -> Self {
        Self::new(DbErrorKind::Task, err.to_string())
    }
}
