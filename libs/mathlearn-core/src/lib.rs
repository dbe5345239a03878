//! Core learning library shared by the client runtime.
//!
//! Provides:
//! - Mixed text/LaTeX content segmentation and rendering
//! - Authentication attempt throttling
//! - Streak, XP and rank calculations
//! - Quiz and flashcard progression state machines
//! - The versioned progress snapshot and its migration
//! - Shared content types (Material, Quiz, FlashcardDeck, etc.)

pub mod content;
pub mod error;
pub mod flashcard;
pub mod gamification;
pub mod progress;
pub mod quiz;
pub mod throttle;
pub mod time;
pub mod types;

pub use content::{
    render, render_html, segment, DelimiterTypesetter, MathMode, RenderedSegment, Segment,
    TypesetError, Typesetter,
};
pub use error::{ProgressError, QuizError};
pub use flashcard::{FlashcardResult, FlashcardSession};
pub use gamification::{next_milestone, rank_for_xp, update_streak, xp_for_quiz, Rank};
pub use progress::{Activity, ActivityKind, CompletedTopic, Progress, ProgressDocument};
pub use quiz::{QuizPhase, QuizResult, QuizSession, SubmitReason};
pub use throttle::RateGuard;
pub use time::Clock;
pub use types::{
    Answer, Category, Flashcard, FlashcardDeck, LeaderboardEntry, Material, Profile, Quiz,
    QuizQuestion, Role, UserAccount,
};
