//! Progress tracking: applies completion events, persists the snapshot and
//! mirrors xp/streak to the remote profile.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use mathlearn_core::gamification::milestone_progress;
use mathlearn_core::{
    next_milestone, rank_for_xp, Clock, FlashcardDeck, FlashcardResult, Material, Progress,
    ProgressDocument, Quiz, QuizResult, Rank,
};
use serde::Serialize;

use crate::backend::{Backend, ProgressUpdate};
use crate::db::{lock, DbError, ProgressRepository, SharedStore};
use crate::session::Session;

type Result<T> = std::result::Result<T, DbError>;

/// Derived numbers shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub xp: u32,
    pub streak: u32,
    pub rank: Rank,
    pub next_milestone: u32,
    pub milestone_progress: f64,
}

pub struct ProgressTracker {
    store: SharedStore,
    backend: Arc<dyn Backend>,
    clock: Clock,
    /// Offset used to decide calendar days for the streak.
    offset: FixedOffset,
    document: ProgressDocument,
}

impl ProgressTracker {
    /// Load the stored snapshot using the machine's local offset.
    pub fn load(store: SharedStore, backend: Arc<dyn Backend>, clock: Clock) -> Result<Self> {
        let offset = *Local::now().offset();
        Self::load_with_offset(store, backend, clock, offset)
    }

    pub fn load_with_offset(
        store: SharedStore,
        backend: Arc<dyn Backend>,
        clock: Clock,
        offset: FixedOffset,
    ) -> Result<Self> {
        let document = lock(&store)?.load_progress()?;
        tracing::debug!(
            xp = document.progress.xp_points,
            activities = document.progress.activities.len(),
            "progress loaded"
        );
        Ok(Self {
            store,
            backend,
            clock,
            offset,
            document,
        })
    }

    pub fn progress(&self) -> &Progress {
        &self.document.progress
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.offset)
    }

    /// Mark a material as read. Returns the XP gained (0 if already read).
    pub async fn complete_topic(&mut self, session: &Session, material: &Material) -> Result<u32> {
        let now = self.now();
        let xp = self.document.progress.complete_topic(material, now);
        if xp == 0 {
            return Ok(0);
        }
        self.commit(session).await?;
        Ok(xp)
    }

    pub async fn complete_quiz(
        &mut self,
        session: &Session,
        quiz: &Quiz,
        result: &QuizResult,
    ) -> Result<u32> {
        let now = self.now();
        let xp = self.document.progress.complete_quiz(quiz, result, now);
        self.commit(session).await?;
        Ok(xp)
    }

    pub async fn complete_flashcards(
        &mut self,
        session: &Session,
        deck: &FlashcardDeck,
        result: &FlashcardResult,
    ) -> Result<u32> {
        let now = self.now();
        let xp = self.document.progress.complete_flashcards(deck, result, now);
        self.commit(session).await?;
        Ok(xp)
    }

    pub fn summary(&self) -> ProgressSummary {
        let xp = self.document.progress.xp_points;
        ProgressSummary {
            xp,
            streak: self.document.progress.streak,
            rank: rank_for_xp(xp),
            next_milestone: next_milestone(xp),
            milestone_progress: milestone_progress(xp),
        }
    }

    async fn commit(&self, session: &Session) -> Result<()> {
        lock(&self.store)?.save_progress(&self.document)?;
        tracing::info!(
            xp = self.document.progress.xp_points,
            streak = self.document.progress.streak,
            "progress saved"
        );
        self.sync_remote(session).await;
        Ok(())
    }

    /// Push xp/streak to the profile. Last write wins; failures only log.
    async fn sync_remote(&self, session: &Session) {
        let (Some(user_id), Some(token)) = (session.user_id(), session.token()) else {
            return;
        };

        let progress = &self.document.progress;
        let update = ProgressUpdate {
            xp_points: progress.xp_points,
            streak: progress.streak,
            last_activity: progress.last_activity(),
        };

        match self
            .backend
            .update_profile_progress(token, user_id, &update)
            .await
        {
            Ok(()) => tracing::debug!(%user_id, "profile progress synced"),
            Err(e) => tracing::warn!(%user_id, error = %e, "profile progress sync failed"),
        }
    }
}
