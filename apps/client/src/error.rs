//! Client error types.

use mathlearn_core::QuizError;
use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;
use crate::db::DbError;
use crate::session::AuthError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("local store: {0}")]
    Db(#[from] DbError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid content: {0}")]
    Invalid(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
