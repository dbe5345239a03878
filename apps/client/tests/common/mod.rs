//! Common test utilities for client integration tests.
//!
//! Provides an in-memory [`FakeBackend`] and a [`TestContext`] wiring it to
//! an in-memory SQLite store, so no network or database server is needed.

#![allow(dead_code)]

pub mod fixtures;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use mathlearn_client::backend::{AuthSession, ProgressUpdate, Result};
use mathlearn_client::db::{SharedStore, SqliteStore};
use mathlearn_client::{Backend, BackendError, ContentRecord, ContentTable, Session};
use mathlearn_core::{
    Category, Clock, FlashcardDeck, LeaderboardEntry, Material, Profile, Quiz, RateGuard, Role,
    UserAccount,
};

pub const PASSWORD: &str = "rahasia123";

/// Recorded state of the fake backend.
#[derive(Default)]
pub struct FakeState {
    pub accounts: HashMap<String, UserAccount>,
    pub tokens: HashMap<String, Uuid>,
    pub sign_in_calls: usize,
    pub signed_out: Vec<String>,
    pub reset_requests: Vec<String>,
    pub profile_updates: Vec<(Uuid, ProgressUpdate)>,
    pub fail_profile_updates: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub leaderboard_calls: usize,
    pub fail_leaderboard: bool,
    pub materials: Vec<Material>,
    pub quizzes: Vec<Quiz>,
    pub decks: Vec<FlashcardDeck>,
    pub deck_lookups: usize,
    pub upserts: Vec<ContentRecord>,
    pub deletes: Vec<(ContentTable, Uuid)>,
    pub roles: Vec<(Uuid, Role)>,
}

/// In-memory backend. Every account's password is [`PASSWORD`].
#[derive(Default)]
pub struct FakeBackend {
    pub state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_account(&self, email: &str, role: Role) -> UserAccount {
        let account = UserAccount {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
        };
        self.state()
            .accounts
            .insert(email.to_string(), account.clone());
        account
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn user_for(&self, token: &str) -> Result<UserAccount> {
        let state = self.state();
        state
            .tokens
            .get(token)
            .and_then(|id| state.accounts.values().find(|a| a.id == *id))
            .cloned()
            .ok_or(BackendError::Backend {
                status: 401,
                message: "invalid token".into(),
            })
    }
}

fn filter<T: Clone>(items: &[T], category: Option<&str>, of: impl Fn(&T) -> &str) -> Vec<T> {
    items
        .iter()
        .filter(|item| category.map_or(true, |c| of(item) == c))
        .cloned()
        .collect()
}

#[async_trait]
impl Backend for FakeBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let mut state = self.state();
        state.sign_in_calls += 1;

        let account = match state.accounts.get(email) {
            Some(account) if password == PASSWORD => account.clone(),
            _ => {
                return Err(BackendError::Backend {
                    status: 400,
                    message: "Invalid login credentials".into(),
                })
            }
        };

        let token = format!("token-{}", Uuid::new_v4());
        state.tokens.insert(token.clone(), account.id);
        Ok(AuthSession {
            access_token: token,
            refresh_token: None,
            user: account,
        })
    }

    async fn sign_up(&self, email: &str, _password: &str, _username: &str) -> Result<UserAccount> {
        if self.state().accounts.contains_key(email) {
            return Err(BackendError::Backend {
                status: 422,
                message: "User already registered".into(),
            });
        }
        Ok(self.add_account(email, Role::Student))
    }

    async fn get_user(&self, token: &str) -> Result<UserAccount> {
        self.user_for(token)
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        let mut state = self.state();
        state.tokens.remove(token);
        state.signed_out.push(token.to_string());
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        self.state().reset_requests.push(email.to_string());
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(Vec::new())
    }

    async fn list_materials(&self, category: Option<&str>) -> Result<Vec<Material>> {
        Ok(filter(&self.state().materials, category, |m| m.category.as_str()))
    }

    async fn list_quizzes(&self, category: Option<&str>) -> Result<Vec<Quiz>> {
        Ok(filter(&self.state().quizzes, category, |q| q.category.as_str()))
    }

    async fn get_quiz(&self, id: Uuid) -> Result<Option<Quiz>> {
        Ok(self.state().quizzes.iter().find(|q| q.id == id).cloned())
    }

    async fn list_flashcard_decks(&self, category: Option<&str>) -> Result<Vec<FlashcardDeck>> {
        Ok(filter(&self.state().decks, category, |d| d.category.as_str()))
    }

    async fn get_flashcard_deck(&self, id: Uuid) -> Result<Option<FlashcardDeck>> {
        let mut state = self.state();
        state.deck_lookups += 1;
        Ok(state.decks.iter().find(|d| d.id == id).cloned())
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let state = self.state();
        let latest = state
            .profile_updates
            .iter()
            .rev()
            .find(|(id, _)| *id == user_id);
        Ok(latest.map(|(id, update)| Profile {
            id: *id,
            username: "siswa".into(),
            xp_points: update.xp_points,
            streak: update.streak,
            last_activity: update.last_activity,
        }))
    }

    async fn update_profile_progress(
        &self,
        token: &str,
        user_id: Uuid,
        update: &ProgressUpdate,
    ) -> Result<()> {
        self.user_for(token)?;
        let mut state = self.state();
        if state.fail_profile_updates {
            return Err(BackendError::Network("connection reset".into()));
        }
        state.profile_updates.push((user_id, update.clone()));
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut state = self.state();
        state.leaderboard_calls += 1;
        if state.fail_leaderboard {
            return Err(BackendError::Network("timeout".into()));
        }
        Ok(state.leaderboard.iter().take(limit).cloned().collect())
    }

    async fn upsert_content(&self, token: &str, record: &ContentRecord) -> Result<()> {
        self.user_for(token)?;
        self.state().upserts.push(record.clone());
        Ok(())
    }

    async fn delete_content(&self, token: &str, table: ContentTable, id: Uuid) -> Result<()> {
        self.user_for(token)?;
        self.state().deletes.push((table, id));
        Ok(())
    }

    async fn assign_role(&self, token: &str, user_id: Uuid, role: Role) -> Result<()> {
        self.user_for(token)?;
        self.state().roles.push((user_id, role));
        Ok(())
    }
}

/// Fake backend plus an in-memory store.
pub struct TestContext {
    pub backend: Arc<FakeBackend>,
    pub store: SharedStore,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            backend: FakeBackend::new(),
            store: SqliteStore::open_in_memory().unwrap().shared(),
        }
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    /// Session with the default 3-per-60s guard and a fixed clock.
    pub fn session(&self, clock: Clock) -> Session {
        Session::restore(
            self.backend(),
            self.store.clone(),
            RateGuard::new(Duration::seconds(60), 3),
            clock,
        )
        .unwrap()
    }

    /// Register an account and return a session signed in as it.
    pub async fn signed_in(&self, role: Role, clock: Clock) -> Session {
        let email = format!("{}@example.com", Uuid::new_v4());
        self.backend.add_account(&email, role);
        let mut session = self.session(clock);
        session.sign_in(&email, PASSWORD).await.unwrap();
        session
    }
}

/// 2024-03-10 08:00:00 UTC.
pub fn start_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-10T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}
