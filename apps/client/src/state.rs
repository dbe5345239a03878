//! Application state.

use std::sync::Arc;

use mathlearn_core::{Clock, RateGuard};

use crate::backend::{Backend, RestBackend};
use crate::catalog::Catalog;
use crate::config::ClientConfig;
use crate::db::{SharedStore, SqliteStore};
use crate::error::Result;
use crate::leaderboard::{LeaderboardPoller, DEFAULT_LIMIT};
use crate::progress::ProgressTracker;
use crate::session::Session;

/// Long-lived handles shared by the UI shell.
pub struct AppState {
    pub config: ClientConfig,
    pub store: SharedStore,
    pub backend: Arc<dyn Backend>,
}

impl AppState {
    /// Open the local store under the configured data directory and connect
    /// the REST backend.
    pub fn open(config: ClientConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db_path = config.db_path();
        let store = SqliteStore::open(&db_path)?.shared();
        tracing::info!(path = %db_path.display(), "local store opened");

        let backend = Arc::new(RestBackend::new(&config.backend_url, &config.anon_key));
        Ok(Self::with_parts(config, store, backend))
    }

    pub fn with_parts(config: ClientConfig, store: SharedStore, backend: Arc<dyn Backend>) -> Self {
        Self {
            config,
            store,
            backend,
        }
    }

    pub fn rate_guard(&self) -> Result<RateGuard> {
        Ok(RateGuard::new(
            self.config.auth_window_duration()?,
            self.config.auth_max_attempts,
        ))
    }

    pub fn session(&self, clock: Clock) -> Result<Session> {
        Ok(Session::restore(
            self.backend.clone(),
            self.store.clone(),
            self.rate_guard()?,
            clock,
        )?)
    }

    pub fn progress_tracker(&self, clock: Clock) -> Result<ProgressTracker> {
        Ok(ProgressTracker::load(
            self.store.clone(),
            self.backend.clone(),
            clock,
        )?)
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.backend.clone())
    }

    /// Must be called inside a tokio runtime.
    pub fn leaderboard_poller(&self) -> Result<LeaderboardPoller> {
        self.config.validate()?;
        Ok(LeaderboardPoller::spawn(
            self.backend.clone(),
            self.config.leaderboard_poll,
            DEFAULT_LIMIT,
        ))
    }
}
