//! Content browsing and starting quiz/flashcard runs.

use std::sync::Arc;

use mathlearn_core::{
    render_html, Category, FlashcardDeck, FlashcardSession, Material, Quiz, QuizSession,
    Typesetter,
};
use uuid::Uuid;

use crate::backend::Backend;
use crate::error::{ClientError, Result};

#[derive(Clone)]
pub struct Catalog {
    backend: Arc<dyn Backend>,
}

impl Catalog {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.backend.list_categories().await?)
    }

    /// Materials, optionally limited to one category slug.
    pub async fn materials(&self, category: Option<&str>) -> Result<Vec<Material>> {
        Ok(self.backend.list_materials(category).await?)
    }

    pub async fn quizzes(&self, category: Option<&str>) -> Result<Vec<Quiz>> {
        Ok(self.backend.list_quizzes(category).await?)
    }

    pub async fn flashcard_decks(&self, category: Option<&str>) -> Result<Vec<FlashcardDeck>> {
        Ok(self.backend.list_flashcard_decks(category).await?)
    }

    /// Fetch a quiz and return a started session for it.
    pub async fn start_quiz(&self, id: Uuid) -> Result<QuizSession> {
        let quiz = self
            .backend
            .get_quiz(id)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("quiz {id}")))?;

        let mut session = QuizSession::new(quiz);
        session.start()?;
        tracing::info!(quiz = %id, questions = session.len(), "quiz started");
        Ok(session)
    }

    pub async fn start_flashcards(&self, id: Uuid) -> Result<FlashcardSession> {
        let deck = self
            .backend
            .get_flashcard_deck(id)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("flashcard deck {id}")))?;

        Ok(FlashcardSession::new(deck)?)
    }
}

/// Material body as HTML, math typeset by `typesetter`.
pub fn render_material<T: Typesetter + ?Sized>(material: &Material, typesetter: &T) -> String {
    render_html(&material.content, typesetter)
}
