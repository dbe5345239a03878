//! Client runtime for the mathematics learning platform.
//!
//! Owns the explicit auth session, the local SQLite store, the hosted
//! backend client, progress tracking and the quiz/leaderboard drivers.

pub mod admin;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod leaderboard;
pub mod progress;
pub mod session;
pub mod state;
pub mod timer;

pub use admin::Admin;
pub use backend::{Backend, BackendError, ContentRecord, ContentTable, RestBackend};
pub use catalog::{render_material, Catalog};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, Result};
pub use leaderboard::{LeaderboardPoller, LeaderboardSnapshot};
pub use progress::{ProgressSummary, ProgressTracker};
pub use session::{AuthError, Session, SessionState};
pub use state::AppState;
pub use timer::{spawn_countdown, TimerHandle};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber, filtered by `RUST_LOG` (default
/// `info`). Later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
