//! Error classification for the execution plane.
//!
//! Mirrors spec.md §7's four-way split: validation failures, not-found/gone,
//! place-failures, and infrastructure errors. Only the boundary where the
//! *kind* of failure changes control flow (retry vs. dead-letter vs.
//! terminal-fail) needs this typed enum; everything upstream of that
//! boundary propagates `anyhow::Result` the way the rest of the codebase
//! does.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DialerError {
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("call placement failed: {0}")]
    PlaceFailure(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("concurrency gate error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl DialerError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
