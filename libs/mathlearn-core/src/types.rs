//! Core content and account types for the learning platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gamification::{rank_for_xp, Rank};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::Student
    }
}

impl Role {
    /// Get the role name as stored by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }
}

/// Authenticated user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Content category (e.g. "aljabar", "geometri").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Learning material. `content` is mixed text and LaTeX.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub category: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A recorded or expected answer: an option index or free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Choice(usize),
    Text(String),
}

impl Answer {
    /// Whether this answer matches the expected one.
    ///
    /// Choices compare by index. Text compares after whitespace
    /// normalization, ignoring case. A choice never matches text.
    pub fn matches(&self, expected: &Answer) -> bool {
        match (self, expected) {
            (Self::Choice(a), Self::Choice(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => {
                normalize_whitespace(a).to_lowercase() == normalize_whitespace(b).to_lowercase()
            }
            _ => false,
        }
    }
}

/// Normalize whitespace in a string (trim and collapse multiple spaces).
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Single quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: Answer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Quiz with its questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub category: String,
    pub title: String,
    /// Time limit for the whole quiz; `None` means untimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<u32>,
    pub questions: Vec<QuizQuestion>,
}

/// Single flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// Deck of flashcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardDeck {
    pub id: Uuid,
    pub category: String,
    pub title: String,
    pub cards: Vec<Flashcard>,
}

/// Remote user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub xp_points: u32,
    #[serde(default)]
    pub streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn rank(&self) -> Rank {
        rank_for_xp(self.xp_points)
    }
}

/// Leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub username: String,
    pub xp_points: u32,
    #[serde(default)]
    pub streak: u32,
}

impl LeaderboardEntry {
    pub fn rank(&self) -> Rank {
        rank_for_xp(self.xp_points)
    }
}
