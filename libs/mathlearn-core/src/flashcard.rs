//! Flashcard review progression.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::QuizError;
use crate::types::{Flashcard, FlashcardDeck};

pub type Result<T> = std::result::Result<T, QuizError>;

/// Outcome of a finished deck run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardResult {
    pub known: u32,
    pub total: u32,
}

/// One pass through a flashcard deck.
#[derive(Debug, Clone)]
pub struct FlashcardSession {
    deck: FlashcardDeck,
    current_index: usize,
    flipped: bool,
    marks: BTreeMap<usize, bool>,
    result: Option<FlashcardResult>,
}

impl FlashcardSession {
    pub fn new(deck: FlashcardDeck) -> Result<Self> {
        if deck.cards.is_empty() {
            return Err(QuizError::Empty);
        }
        Ok(Self {
            deck,
            current_index: 0,
            flipped: false,
            marks: BTreeMap::new(),
            result: None,
        })
    }

    pub fn deck(&self) -> &FlashcardDeck {
        &self.deck
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> &Flashcard {
        &self.deck.cards[self.current_index]
    }

    pub fn len(&self) -> usize {
        self.deck.cards.len()
    }

    /// Always false: empty decks are rejected by [`FlashcardSession::new`].
    pub fn is_empty(&self) -> bool {
        self.deck.cards.is_empty()
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn marks(&self) -> &BTreeMap<usize, bool> {
        &self.marks
    }

    /// Show the other side of the current card.
    pub fn flip(&mut self) {
        if !self.is_finished() {
            self.flipped = !self.flipped;
        }
    }

    pub fn go_next(&mut self) {
        if !self.is_finished() && self.current_index + 1 < self.len() {
            self.current_index += 1;
            self.flipped = false;
        }
    }

    pub fn go_prev(&mut self) {
        if !self.is_finished() && self.current_index > 0 {
            self.current_index -= 1;
            self.flipped = false;
        }
    }

    /// Mark the current card as known or not.
    pub fn mark(&mut self, known: bool) -> Result<()> {
        if self.is_finished() {
            return Err(QuizError::AlreadySubmitted);
        }
        self.marks.insert(self.current_index, known);
        Ok(())
    }

    /// Close the run. Finishing again returns the stored result.
    pub fn finish(&mut self) -> FlashcardResult {
        if let Some(result) = &self.result {
            return result.clone();
        }
        let result = FlashcardResult {
            known: self.marks.values().filter(|known| **known).count() as u32,
            total: self.len() as u32,
        };
        self.result = Some(result.clone());
        result
    }

    pub fn reset(&mut self) {
        self.current_index = 0;
        self.flipped = false;
        self.marks.clear();
        self.result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn deck(n: usize) -> FlashcardDeck {
        FlashcardDeck {
            id: Uuid::new_v4(),
            category: "geometri".into(),
            title: "Luas bangun datar".into(),
            cards: (0..n)
                .map(|i| Flashcard {
                    front: format!("Q{}", i),
                    back: format!("A{}", i),
                })
                .collect(),
        }
    }

    #[test]
    fn empty_deck_rejected() {
        assert!(matches!(FlashcardSession::new(deck(0)), Err(QuizError::Empty)));
    }

    #[test]
    fn moving_unflips_card() {
        let mut session = FlashcardSession::new(deck(2)).unwrap();
        session.flip();
        assert!(session.is_flipped());
        session.go_next();
        assert!(!session.is_flipped());
        assert_eq!(session.current().front, "Q1");
        session.go_next();
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn finish_counts_known_cards() {
        let mut session = FlashcardSession::new(deck(3)).unwrap();
        session.mark(true).unwrap();
        session.go_next();
        session.mark(false).unwrap();
        session.go_next();
        session.mark(true).unwrap();
        assert_eq!(session.finish(), FlashcardResult { known: 2, total: 3 });
        assert_eq!(session.mark(false), Err(QuizError::AlreadySubmitted));
        assert_eq!(session.finish(), FlashcardResult { known: 2, total: 3 });
    }

    #[test]
    fn remarking_overwrites() {
        let mut session = FlashcardSession::new(deck(1)).unwrap();
        session.mark(true).unwrap();
        session.mark(false).unwrap();
        assert_eq!(session.finish().known, 0);
    }

    #[test]
    fn reset_clears_marks() {
        let mut session = FlashcardSession::new(deck(2)).unwrap();
        session.mark(true).unwrap();
        session.finish();
        session.reset();
        assert!(!session.is_finished());
        assert!(session.marks().is_empty());
    }
}
