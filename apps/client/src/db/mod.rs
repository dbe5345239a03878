//! Local SQLite key-value storage.

pub mod error;
pub mod repository;
pub mod schema;

pub use error::DbError;
pub use repository::{
    lock, LocalStore, ProgressRepository, SessionRepository, SharedStore, SqliteStore, StorageKey,
};
