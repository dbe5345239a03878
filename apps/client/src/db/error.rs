//! Database error types.

use mathlearn_core::ProgressError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid stored value: {0}")]
    InvalidData(#[from] serde_json::Error),

    #[error("progress snapshot: {0}")]
    Progress(#[from] ProgressError),

    #[error("store lock poisoned")]
    LockPoisoned,
}
