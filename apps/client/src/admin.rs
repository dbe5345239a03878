//! Admin back office: content CRUD and role assignment.

use std::sync::Arc;

use mathlearn_core::{Answer, Role};
use uuid::Uuid;

use crate::backend::{Backend, ContentRecord, ContentTable};
use crate::error::{ClientError, Result};
use crate::session::Session;

/// Admin operations bound to an admin's token.
pub struct Admin {
    backend: Arc<dyn Backend>,
    token: String,
}

impl Admin {
    /// Fails with [`ClientError::Forbidden`] unless `session` belongs to an admin.
    pub fn new(backend: Arc<dyn Backend>, session: &Session) -> Result<Self> {
        let token = match (session.is_admin(), session.token()) {
            (true, Some(token)) => token.to_string(),
            _ => {
                tracing::warn!(user_id = ?session.user_id(), "admin access denied");
                return Err(ClientError::Forbidden("admin role required".into()));
            }
        };
        Ok(Self { backend, token })
    }

    /// Create or replace a content row.
    pub async fn save(&self, record: &ContentRecord) -> Result<()> {
        validate(record)?;
        self.backend.upsert_content(&self.token, record).await?;
        Ok(())
    }

    pub async fn delete(&self, table: ContentTable, id: Uuid) -> Result<()> {
        self.backend.delete_content(&self.token, table, id).await?;
        Ok(())
    }

    pub async fn assign_role(&self, user_id: Uuid, role: Role) -> Result<()> {
        self.backend.assign_role(&self.token, user_id, role).await?;
        Ok(())
    }
}

fn validate(record: &ContentRecord) -> Result<()> {
    let invalid = |msg: String| Err(ClientError::Invalid(msg));

    match record {
        ContentRecord::Category(c) if c.slug.trim().is_empty() => {
            invalid("category slug is empty".into())
        }
        ContentRecord::Material(m) if m.title.trim().is_empty() => {
            invalid("material title is empty".into())
        }
        ContentRecord::Quiz(q) => {
            if q.questions.is_empty() {
                return invalid(format!("quiz {:?} has no questions", q.title));
            }
            for (idx, question) in q.questions.iter().enumerate() {
                if let Answer::Choice(choice) = question.correct_answer {
                    if choice >= question.options.len() {
                        return invalid(format!(
                            "question {} answer {} is not one of {} options",
                            idx + 1,
                            choice,
                            question.options.len()
                        ));
                    }
                }
            }
            Ok(())
        }
        ContentRecord::FlashcardDeck(d) if d.cards.is_empty() => {
            invalid(format!("deck {:?} has no cards", d.title))
        }
        _ => Ok(()),
    }
}
