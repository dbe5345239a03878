//! Error types for mathlearn-core.

use thiserror::Error;

/// Errors raised by the quiz and flashcard state machines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("session has no items")]
    Empty,

    #[error("session has not been started")]
    NotStarted,

    #[error("session already submitted")]
    AlreadySubmitted,

    #[error("item index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors that can occur while decoding a progress snapshot.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("malformed progress snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("malformed progress snapshot: {0}")]
    Shape(&'static str),

    #[error("unsupported progress snapshot version {found} (newest known {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

impl ProgressError {
    /// Whether the stored bytes are unreadable, as opposed to written by a
    /// newer client.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::Shape(_))
    }
}
