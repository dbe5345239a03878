//! Explicit authentication session.
//!
//! Created once at startup, restored from the local store, updated on auth
//! events and cleared on sign-out. Every auth request (sign-in, sign-up,
//! password reset) goes through the same rolling-window [`RateGuard`].

use std::sync::Arc;

use mathlearn_core::{Clock, RateGuard, Role, UserAccount};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::{Backend, BackendError};
use crate::db::{lock, DbError, LocalStore, SessionRepository, SharedStore, SqliteStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("too many attempts, retry in {retry_after_secs} seconds")]
    Throttled { retry_after_secs: u64 },

    #[error("authentication failed: {0}")]
    Backend(#[from] BackendError),

    #[error("local store: {0}")]
    Store(#[from] DbError),

    #[error("not signed in")]
    NotSignedIn,
}

type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn { user: UserAccount, token: String },
}

pub struct Session {
    backend: Arc<dyn Backend>,
    store: SharedStore,
    guard: RateGuard,
    clock: Clock,
    state: SessionState,
}

impl Session {
    /// Build a session, picking up a persisted sign-in if one exists.
    pub fn restore(
        backend: Arc<dyn Backend>,
        store: SharedStore,
        guard: RateGuard,
        clock: Clock,
    ) -> Result<Self> {
        let state = {
            let store = lock(&store)?;
            match (store.load_user()?, store.load_token()?) {
                (Some(user), Some(token)) => SessionState::SignedIn { user, token },
                _ => SessionState::SignedOut,
            }
        };

        if let SessionState::SignedIn { user, .. } = &state {
            tracing::info!(user_id = %user.id, "restored session");
        }

        Ok(Self {
            backend,
            store,
            guard,
            clock,
            state,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_user(&self) -> Option<&UserAccount> {
        match &self.state {
            SessionState::SignedIn { user, .. } => Some(user),
            SessionState::SignedOut => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.current_user().map(|u| u.id)
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::SignedIn { token, .. } => Some(token),
            SessionState::SignedOut => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self.state, SessionState::SignedIn { .. })
    }

    pub fn is_admin(&self) -> bool {
        self.current_user().is_some_and(|u| u.role == Role::Admin)
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Sign in with email and password.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&UserAccount> {
        self.admit("sign_in")?;

        let auth = match self.backend.sign_in(email, password).await {
            Ok(auth) => auth,
            Err(e) => {
                tracing::warn!(error = %e, "sign-in failed");
                return Err(e.into());
            }
        };
        self.guard.reset();

        self.with_store(|store| {
            store.save_token(&auth.access_token)?;
            store.save_user(&auth.user)
        })?;

        tracing::info!(user_id = %auth.user.id, role = auth.user.role.as_str(), "signed in");
        self.state = SessionState::SignedIn {
            user: auth.user,
            token: auth.access_token,
        };
        self.current_user().ok_or(AuthError::NotSignedIn)
    }

    /// Register a new account. The caller signs in separately.
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<UserAccount> {
        self.admit("sign_up")?;
        let user = self.backend.sign_up(email, password, username).await?;
        tracing::info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    pub async fn request_password_reset(&mut self, email: &str) -> Result<()> {
        self.admit("password_reset")?;
        self.backend.reset_password(email).await?;
        tracing::info!("password reset requested");
        Ok(())
    }

    /// Re-read the account (role changes included) from the backend.
    ///
    /// A rejected token signs the session out locally.
    pub async fn refresh_user(&mut self) -> Result<&UserAccount> {
        let token = self.token().ok_or(AuthError::NotSignedIn)?.to_string();

        let user = match self.backend.get_user(&token).await {
            Ok(user) => user,
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("stored token rejected, clearing session");
                self.clear_local()?;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        self.with_store(|store| store.save_user(&user))?;
        self.state = SessionState::SignedIn { user, token };
        self.current_user().ok_or(AuthError::NotSignedIn)
    }

    /// Sign out. Local session keys are cleared even if the backend call
    /// fails; stored progress is kept.
    pub async fn sign_out(&mut self) -> Result<()> {
        if let Some(token) = self.token() {
            if let Err(e) = self.backend.sign_out(token).await {
                tracing::warn!(error = %e, "remote sign-out failed");
            }
        }
        self.clear_local()?;
        tracing::info!("signed out");
        Ok(())
    }

    /// Throttle check followed by recording the attempt.
    fn admit(&mut self, action: &'static str) -> Result<()> {
        let now = self.clock.now();
        if let Some(retry_after_secs) = self.guard.retry_after_secs(now) {
            tracing::warn!(action, retry_after_secs, "auth attempt throttled");
            return Err(AuthError::Throttled { retry_after_secs });
        }
        self.guard.record_attempt(now);
        Ok(())
    }

    fn clear_local(&mut self) -> Result<()> {
        self.with_store(|store| store.clear_session())?;
        self.state = SessionState::SignedOut;
        Ok(())
    }

    fn with_store<T>(
        &self,
        f: impl FnOnce(&SqliteStore) -> std::result::Result<T, DbError>,
    ) -> Result<T> {
        let store = lock(&self.store)?;
        Ok(f(&store)?)
    }
}
