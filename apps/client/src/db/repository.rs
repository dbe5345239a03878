//! Repository pattern for local storage access.

use crate::db::error::DbError;
use chrono::Utc;
use mathlearn_core::{ProgressDocument, UserAccount};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

type Result<T> = std::result::Result<T, DbError>;

/// Store shared between the session and the progress tracker.
pub type SharedStore = Arc<Mutex<SqliteStore>>;

/// Fixed keys of the local key-value storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    UserProgress,
    /// Last unreadable progress snapshot, set aside on load.
    ProgressBackup,
    User,
    Token,
    UserId,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserProgress => "userProgress",
            Self::ProgressBackup => "userProgressBackup",
            Self::User => "user",
            Self::Token => "token",
            Self::UserId => "userId",
        }
    }
}

/// Raw key-value access.
pub trait LocalStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>>;
    fn set(&self, key: StorageKey, value: &str) -> Result<()>;
    fn remove(&self, key: StorageKey) -> Result<()>;
    /// Remove everything tied to the signed-in account, keeping progress.
    fn clear_session(&self) -> Result<()>;
}

/// Repository for the progress snapshot.
pub trait ProgressRepository {
    /// Load the snapshot, migrating and rewriting legacy documents.
    fn load_progress(&self) -> Result<ProgressDocument>;
    fn save_progress(&self, document: &ProgressDocument) -> Result<()>;
}

/// Repository for the persisted sign-in.
pub trait SessionRepository {
    fn load_user(&self) -> Result<Option<UserAccount>>;
    fn save_user(&self, user: &UserAccount) -> Result<()>;
    fn load_token(&self) -> Result<Option<String>>;
    fn save_token(&self, token: &str) -> Result<()>;
}

/// SQLite implementation of the local store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Wrap into the shared handle used across the client.
    pub fn shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(super::schema::SCHEMA)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![super::schema::SCHEMA_VERSION],
        )?;
        Ok(())
    }

    pub fn schema_version(&self) -> Result<i32> {
        let version: i32 = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
        Ok(version)
    }
}

/// Lock a shared store, mapping poisoning to [`DbError::LockPoisoned`].
pub fn lock(store: &SharedStore) -> Result<MutexGuard<'_, SqliteStore>> {
    store.lock().map_err(|_| DbError::LockPoisoned)
}

impl LocalStore for SqliteStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key.as_str(), value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        self.conn.execute(
            "DELETE FROM local_storage WHERE key = ?1",
            params![key.as_str()],
        )?;
        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        for key in [StorageKey::User, StorageKey::Token, StorageKey::UserId] {
            self.remove(key)?;
        }
        Ok(())
    }
}

impl ProgressRepository for SqliteStore {
    fn load_progress(&self) -> Result<ProgressDocument> {
        let Some(json) = self.get(StorageKey::UserProgress)? else {
            return Ok(ProgressDocument::default());
        };

        let document = match ProgressDocument::decode(&json) {
            Ok(document) => document,
            Err(e) if e.is_malformed() => {
                tracing::warn!(error = %e, "stored progress unreadable, starting fresh");
                self.set(StorageKey::ProgressBackup, &json)?;
                let document = ProgressDocument::default();
                self.save_progress(&document)?;
                return Ok(document);
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(from) = document.migrated_from {
            tracing::info!(from, to = document.version, "migrated stored progress snapshot");
            self.save_progress(&document)?;
        }
        Ok(document)
    }

    fn save_progress(&self, document: &ProgressDocument) -> Result<()> {
        let json = document.encode()?;
        self.set(StorageKey::UserProgress, &json)
    }
}

impl SessionRepository for SqliteStore {
    fn load_user(&self) -> Result<Option<UserAccount>> {
        self.get(StorageKey::User)?
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }

    fn save_user(&self, user: &UserAccount) -> Result<()> {
        self.set(StorageKey::User, &serde_json::to_string(user)?)?;
        self.set(StorageKey::UserId, &user.id.to_string())
    }

    fn load_token(&self) -> Result<Option<String>> {
        self.get(StorageKey::Token)
    }

    fn save_token(&self, token: &str) -> Result<()> {
        self.set(StorageKey::Token, token)
    }
}
