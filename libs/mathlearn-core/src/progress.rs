//! Learner progress record and its persisted snapshot.
//!
//! The snapshot is a versioned JSON document. Version-less blobs written by
//! earlier clients (camelCase keys, string `type` discriminants) are migrated
//! on decode.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ProgressError;
use crate::flashcard::FlashcardResult;
use crate::gamification::{update_streak, FLASHCARD_COMPLETION_XP, TOPIC_COMPLETION_XP};
use crate::quiz::QuizResult;
use crate::types::{FlashcardDeck, Material, Quiz};

pub type Result<T> = std::result::Result<T, ProgressError>;

/// Activities kept in the feed; older entries are dropped.
pub const MAX_ACTIVITIES: usize = 15;

/// Current snapshot schema version.
pub const PROGRESS_VERSION: u32 = 1;

/// A finished learning material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTopic {
    pub id: String,
    pub category: String,
    pub title: String,
    pub completed_at: DateTime<Utc>,
}

/// What an activity entry records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    Material {
        topic_id: String,
        category: String,
    },
    Quiz {
        quiz_id: String,
        score: u32,
        total_questions: u32,
    },
    Flashcard {
        deck_id: String,
        cards_reviewed: u32,
        #[serde(default)]
        known: u32,
    },
}

/// Entry in the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub xp_gained: u32,
    #[serde(flatten)]
    pub kind: ActivityKind,
}

impl Activity {
    /// One-line description for the activity feed.
    pub fn describe(&self) -> String {
        match &self.kind {
            ActivityKind::Material { category, .. } => {
                format!("Completed material \"{}\" ({})", self.title, category)
            }
            ActivityKind::Quiz {
                score,
                total_questions,
                ..
            } => format!("Quiz \"{}\": {}/{} correct", self.title, score, total_questions),
            ActivityKind::Flashcard {
                cards_reviewed,
                known,
                ..
            } => format!(
                "Reviewed {} flashcards in \"{}\" ({} known)",
                cards_reviewed, self.title, known
            ),
        }
    }
}

/// Learner progress owned by the client session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub completed_topics: Vec<CompletedTopic>,
    /// Newest first, at most [`MAX_ACTIVITIES`] entries.
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub xp_points: u32,
    #[serde(default)]
    pub streak: u32,
}

impl Progress {
    /// Timestamp of the most recent activity.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.activities.iter().map(|a| a.timestamp).max()
    }

    pub fn has_completed_topic(&self, id: &str) -> bool {
        self.completed_topics.iter().any(|t| t.id == id)
    }

    /// Mark a material as read. Returns the XP gained (0 if already done).
    pub fn complete_topic<Tz: TimeZone>(&mut self, material: &Material, now: DateTime<Tz>) -> u32 {
        let id = material.id.to_string();
        if self.has_completed_topic(&id) {
            return 0;
        }

        let at = now.with_timezone(&Utc);
        self.completed_topics.push(CompletedTopic {
            id: id.clone(),
            category: material.category.clone(),
            title: material.title.clone(),
            completed_at: at,
        });
        self.record(
            &material.title,
            ActivityKind::Material {
                topic_id: id,
                category: material.category.clone(),
            },
            TOPIC_COMPLETION_XP,
            now,
        )
    }

    /// Record a submitted quiz. Returns the XP gained.
    pub fn complete_quiz<Tz: TimeZone>(
        &mut self,
        quiz: &Quiz,
        result: &QuizResult,
        now: DateTime<Tz>,
    ) -> u32 {
        self.record(
            &quiz.title,
            ActivityKind::Quiz {
                quiz_id: quiz.id.to_string(),
                score: result.score,
                total_questions: result.total,
            },
            result.xp,
            now,
        )
    }

    /// Record a finished flashcard run. Returns the XP gained.
    pub fn complete_flashcards<Tz: TimeZone>(
        &mut self,
        deck: &FlashcardDeck,
        result: &FlashcardResult,
        now: DateTime<Tz>,
    ) -> u32 {
        self.record(
            &deck.title,
            ActivityKind::Flashcard {
                deck_id: deck.id.to_string(),
                cards_reviewed: result.total,
                known: result.known,
            },
            FLASHCARD_COMPLETION_XP,
            now,
        )
    }

    fn record<Tz: TimeZone>(
        &mut self,
        title: &str,
        kind: ActivityKind,
        xp: u32,
        now: DateTime<Tz>,
    ) -> u32 {
        let at = now.with_timezone(&Utc);
        self.streak = update_streak(self.streak, self.last_activity(), now);
        self.xp_points = self.xp_points.saturating_add(xp);
        self.activities.insert(
            0,
            Activity {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                timestamp: at,
                xp_gained: xp,
                kind,
            },
        );
        self.activities.truncate(MAX_ACTIVITIES);
        xp
    }
}

/// Versioned snapshot persisted under the `userProgress` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDocument {
    pub version: u32,
    pub progress: Progress,
    /// Version the document was migrated from during decode, if any.
    #[serde(skip)]
    pub migrated_from: Option<u32>,
}

impl Default for ProgressDocument {
    fn default() -> Self {
        Self::new(Progress::default())
    }
}

impl ProgressDocument {
    pub fn new(progress: Progress) -> Self {
        Self {
            version: PROGRESS_VERSION,
            progress,
            migrated_from: None,
        }
    }

    /// Decode a stored snapshot, migrating legacy blobs.
    pub fn decode(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let Some(object) = value.as_object() else {
            return Err(ProgressError::Shape("snapshot is not an object"));
        };
        let version = match object.get("version") {
            None => None,
            Some(v) => Some(
                v.as_u64()
                    .ok_or(ProgressError::Shape("version is not an integer"))?,
            ),
        };
        match version {
            None => {
                let legacy: LegacyProgress = serde_json::from_value(value)?;
                let mut document = Self::new(legacy.migrate());
                document.migrated_from = Some(0);
                Ok(document)
            }
            Some(v) if v == u64::from(PROGRESS_VERSION) => Ok(serde_json::from_value(value)?),
            Some(v) => Err(ProgressError::UnsupportedVersion {
                found: u32::try_from(v).unwrap_or(u32::MAX),
                supported: PROGRESS_VERSION,
            }),
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// === Legacy (version-less) snapshot ===

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyProgress {
    completed_topics: Vec<LegacyTopic>,
    activities: Vec<LegacyActivity>,
    xp_points: Option<f64>,
    streak: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTopic {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    category: String,
    #[serde(default)]
    title: String,
    completed_at: Option<LegacyTimestamp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyActivity {
    id: Option<Value>,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    title: String,
    timestamp: Option<LegacyTimestamp>,
    #[serde(default)]
    xp_gained: Option<f64>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    topic_id: Option<Value>,
    #[serde(default)]
    quiz_id: Option<Value>,
    #[serde(default)]
    deck_id: Option<Value>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    total_questions: Option<f64>,
    #[serde(default)]
    cards_reviewed: Option<f64>,
}

/// Legacy timestamps are either epoch milliseconds or RFC 3339 strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyTimestamp {
    Millis(i64),
    Text(String),
}

impl LegacyTimestamp {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Millis(ms) => DateTime::<Utc>::from_timestamp_millis(*ms),
            Self::Text(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn whole(n: Option<f64>) -> u32 {
    n.filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.min(f64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

impl LegacyProgress {
    fn migrate(self) -> Progress {
        let completed_topics = self
            .completed_topics
            .into_iter()
            .map(|t| CompletedTopic {
                id: id_string(&t.id),
                category: t.category,
                title: t.title,
                completed_at: t
                    .completed_at
                    .and_then(|ts| ts.to_utc())
                    .unwrap_or_default(),
            })
            .collect();

        let mut activities: Vec<Activity> = self
            .activities
            .into_iter()
            .filter_map(LegacyActivity::migrate)
            .collect();
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activities.truncate(MAX_ACTIVITIES);

        Progress {
            completed_topics,
            activities,
            xp_points: whole(self.xp_points),
            streak: whole(self.streak),
        }
    }
}

impl LegacyActivity {
    fn migrate(self) -> Option<Activity> {
        let reference = |v: &Option<Value>| v.as_ref().map(id_string).unwrap_or_default();
        let kind = match self.kind.as_str() {
            "material" | "topic" => ActivityKind::Material {
                topic_id: reference(&self.topic_id),
                category: self.category.clone().unwrap_or_default(),
            },
            "quiz" => ActivityKind::Quiz {
                quiz_id: reference(&self.quiz_id),
                score: whole(self.score),
                total_questions: whole(self.total_questions),
            },
            "flashcard" | "flashcards" => ActivityKind::Flashcard {
                deck_id: reference(&self.deck_id),
                cards_reviewed: whole(self.cards_reviewed),
                known: 0,
            },
            other => {
                tracing::warn!(kind = other, "dropping legacy activity of unknown type");
                return None;
            }
        };

        Some(Activity {
            id: self
                .id
                .as_ref()
                .map(id_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            title: self.title,
            timestamp: self
                .timestamp
                .and_then(|ts| ts.to_utc())
                .unwrap_or_default(),
            xp_gained: whole(self.xp_gained),
            kind,
        })
    }
}
