//! Hosted backend access (auth, content tables, profiles).

pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mathlearn_core::{
    Category, FlashcardDeck, LeaderboardEntry, Material, Profile, Quiz, Role, UserAccount,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use rest::RestBackend;

/// Backend errors.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),

    #[error("backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("not authenticated")]
    NotAuthenticated,
}

impl BackendError {
    /// Whether the backend rejected the credentials or token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::NotAuthenticated)
            || matches!(self, Self::Backend { status, .. } if *status == 401 || *status == 403)
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Tokens and account returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user: UserAccount,
}

/// Progress fields mirrored to the remote profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub xp_points: u32,
    pub streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

/// Content tables editable from the admin back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentTable {
    Categories,
    Materials,
    Quizzes,
    FlashcardDecks,
}

impl ContentTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Materials => "materials",
            Self::Quizzes => "quizzes",
            Self::FlashcardDecks => "flashcard_decks",
        }
    }
}

/// A content row to create or replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "record", rename_all = "snake_case")]
pub enum ContentRecord {
    Category(Category),
    Material(Material),
    Quiz(Quiz),
    FlashcardDeck(FlashcardDeck),
}

impl ContentRecord {
    pub fn table(&self) -> ContentTable {
        match self {
            Self::Category(_) => ContentTable::Categories,
            Self::Material(_) => ContentTable::Materials,
            Self::Quiz(_) => ContentTable::Quizzes,
            Self::FlashcardDeck(_) => ContentTable::FlashcardDecks,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Category(c) => c.id,
            Self::Material(m) => m.id,
            Self::Quiz(q) => q.id,
            Self::FlashcardDeck(d) => d.id,
        }
    }
}

/// Operations the client needs from the hosted backend.
#[async_trait]
pub trait Backend: Send + Sync {
    // Auth
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<UserAccount>;
    async fn get_user(&self, token: &str) -> Result<UserAccount>;
    async fn sign_out(&self, token: &str) -> Result<()>;
    async fn reset_password(&self, email: &str) -> Result<()>;

    // Content
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn list_materials(&self, category: Option<&str>) -> Result<Vec<Material>>;
    async fn list_quizzes(&self, category: Option<&str>) -> Result<Vec<Quiz>>;
    async fn get_quiz(&self, id: Uuid) -> Result<Option<Quiz>>;
    async fn list_flashcard_decks(&self, category: Option<&str>) -> Result<Vec<FlashcardDeck>>;
    async fn get_flashcard_deck(&self, id: Uuid) -> Result<Option<FlashcardDeck>>;

    // Profiles
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;
    async fn update_profile_progress(
        &self,
        token: &str,
        user_id: Uuid,
        update: &ProgressUpdate,
    ) -> Result<()>;
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>>;

    // Admin
    async fn upsert_content(&self, token: &str, record: &ContentRecord) -> Result<()>;
    async fn delete_content(&self, token: &str, table: ContentTable, id: Uuid) -> Result<()>;
    async fn assign_role(&self, token: &str, user_id: Uuid, role: Role) -> Result<()>;
}
