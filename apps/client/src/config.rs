//! Client configuration from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use mathlearn_core::throttle::{DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW_SECS};
use thiserror::Error;

pub const BACKEND_URL: &str = "MATHLEARN_BACKEND_URL";
pub const ANON_KEY: &str = "MATHLEARN_ANON_KEY";
pub const DATA_DIR: &str = "MATHLEARN_DATA_DIR";
pub const LEADERBOARD_POLL_SECS: &str = "MATHLEARN_LEADERBOARD_POLL_SECS";
pub const AUTH_WINDOW_SECS: &str = "MATHLEARN_AUTH_WINDOW_SECS";
pub const AUTH_MAX_ATTEMPTS: &str = "MATHLEARN_AUTH_MAX_ATTEMPTS";

const DEFAULT_POLL_SECS: u64 = 30;
const DB_FILE: &str = "mathlearn.db";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub backend_url: String,
    pub anon_key: String,
    pub data_dir: PathBuf,
    pub leaderboard_poll: Duration,
    pub auth_window: Duration,
    pub auth_max_attempts: usize,
}

impl ClientConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let data_dir = lookup(DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let config = Self {
            backend_url: required(BACKEND_URL)?,
            anon_key: required(ANON_KEY)?,
            data_dir,
            leaderboard_poll: Duration::from_secs(parse_or(
                &lookup,
                LEADERBOARD_POLL_SECS,
                DEFAULT_POLL_SECS,
            )?),
            auth_window: Duration::from_secs(parse_or(
                &lookup,
                AUTH_WINDOW_SECS,
                DEFAULT_WINDOW_SECS as u64,
            )?),
            auth_max_attempts: parse_or(&lookup, AUTH_MAX_ATTEMPTS, DEFAULT_MAX_ATTEMPTS)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot drive the poller or throttle.
    pub fn validate(&self) -> Result<()> {
        if self.leaderboard_poll.is_zero() {
            return Err(invalid(LEADERBOARD_POLL_SECS, self.leaderboard_poll.as_secs()));
        }
        if self.auth_max_attempts == 0 {
            return Err(invalid(AUTH_MAX_ATTEMPTS, self.auth_max_attempts));
        }
        self.auth_window_duration()?;
        Ok(())
    }

    /// Throttle window as a chrono duration.
    pub fn auth_window_duration(&self) -> Result<chrono::Duration> {
        if self.auth_window.is_zero() {
            return Err(invalid(AUTH_WINDOW_SECS, self.auth_window.as_secs()));
        }
        chrono::Duration::from_std(self.auth_window)
            .map_err(|_| invalid(AUTH_WINDOW_SECS, self.auth_window.as_secs()))
    }

    /// Path of the local SQLite store.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mathlearn")
}

fn invalid(name: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
