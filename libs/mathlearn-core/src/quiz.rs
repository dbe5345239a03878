//! Quiz progression state machine.
//!
//! ```text
//! NotStarted --start--> InProgress --submit / timeout--> Submitted
//!      ^                                                     |
//!      +------------------------reset------------------------+
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::QuizError;
use crate::gamification::xp_for_quiz;
use crate::types::{Answer, Quiz};

pub type Result<T> = std::result::Result<T, QuizError>;

/// Why a quiz was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    Manual,
    TimedOut,
}

/// Scored outcome of a submitted quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub total: u32,
    pub percent: u32,
    pub xp: u32,
    pub reason: SubmitReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizPhase {
    NotStarted,
    InProgress,
    Submitted(QuizResult),
}

/// One attempt at a quiz.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: Quiz,
    phase: QuizPhase,
    current_index: usize,
    answers: BTreeMap<usize, Answer>,
    time_left_secs: Option<u32>,
}

impl QuizSession {
    pub fn new(quiz: Quiz) -> Self {
        let time_left_secs = quiz.time_limit_secs;
        Self {
            quiz,
            phase: QuizPhase::NotStarted,
            current_index: 0,
            answers: BTreeMap::new(),
            time_left_secs,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.phase, QuizPhase::InProgress)
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.phase, QuizPhase::Submitted(_))
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quiz.questions.is_empty()
    }

    pub fn answers(&self) -> &BTreeMap<usize, Answer> {
        &self.answers
    }

    pub fn answer(&self, index: usize) -> Option<&Answer> {
        self.answers.get(&index)
    }

    /// Remaining seconds, `None` for untimed quizzes.
    pub fn time_left_secs(&self) -> Option<u32> {
        self.time_left_secs
    }

    /// Result once submitted.
    pub fn result(&self) -> Option<&QuizResult> {
        match &self.phase {
            QuizPhase::Submitted(result) => Some(result),
            _ => None,
        }
    }

    /// Begin the attempt. Starting an already running attempt is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self.is_empty() {
            return Err(QuizError::Empty);
        }
        match self.phase {
            QuizPhase::NotStarted => {
                self.phase = QuizPhase::InProgress;
                self.current_index = 0;
                Ok(())
            }
            QuizPhase::InProgress => Ok(()),
            QuizPhase::Submitted(_) => Err(QuizError::AlreadySubmitted),
        }
    }

    /// Record the answer for question `index`.
    pub fn select_answer(&mut self, index: usize, answer: Answer) -> Result<()> {
        match self.phase {
            QuizPhase::NotStarted => Err(QuizError::NotStarted),
            QuizPhase::Submitted(_) => Err(QuizError::AlreadySubmitted),
            QuizPhase::InProgress => {
                if index >= self.len() {
                    return Err(QuizError::IndexOutOfRange {
                        index,
                        len: self.len(),
                    });
                }
                self.answers.insert(index, answer);
                Ok(())
            }
        }
    }

    /// Answer the current question.
    pub fn answer_current(&mut self, answer: Answer) -> Result<()> {
        self.select_answer(self.current_index, answer)
    }

    pub fn go_next(&mut self) {
        if self.is_in_progress() && self.current_index + 1 < self.len() {
            self.current_index += 1;
        }
    }

    pub fn go_prev(&mut self) {
        if self.is_in_progress() && self.current_index > 0 {
            self.current_index -= 1;
        }
    }

    /// Jump to `index`; ignored when out of range.
    pub fn go_to(&mut self, index: usize) {
        if self.is_in_progress() && index < self.len() {
            self.current_index = index;
        }
    }

    /// Advance the countdown by `elapsed_secs`.
    ///
    /// Returns the result when this tick expires the timer; the submission
    /// happens once, later ticks return `None`.
    pub fn tick(&mut self, elapsed_secs: u32) -> Option<QuizResult> {
        if !self.is_in_progress() {
            return None;
        }
        let left = self.time_left_secs.as_mut()?;
        *left = left.saturating_sub(elapsed_secs);
        if *left == 0 {
            Some(self.finish(SubmitReason::TimedOut))
        } else {
            None
        }
    }

    /// Score and close the attempt. Unanswered questions count as wrong.
    ///
    /// Submitting again returns the stored result unchanged.
    pub fn submit(&mut self) -> Result<QuizResult> {
        if let QuizPhase::Submitted(result) = &self.phase {
            return Ok(result.clone());
        }
        if !self.is_in_progress() {
            return Err(QuizError::NotStarted);
        }
        Ok(self.finish(SubmitReason::Manual))
    }

    fn finish(&mut self, reason: SubmitReason) -> QuizResult {
        let total = self.len() as u32;
        let score = self
            .quiz
            .questions
            .iter()
            .enumerate()
            .filter(|(idx, question)| {
                self.answers
                    .get(idx)
                    .is_some_and(|answer| answer.matches(&question.correct_answer))
            })
            .count() as u32;

        let result = QuizResult {
            score,
            total,
            percent: score * 100 / total.max(1),
            xp: xp_for_quiz(score, total.max(1)),
            reason,
        };
        tracing::debug!(quiz = %self.quiz.id, score, total, ?reason, "quiz submitted");
        self.phase = QuizPhase::Submitted(result.clone());
        result
    }

    /// Return to `NotStarted` for a fresh attempt.
    pub fn reset(&mut self) {
        self.phase = QuizPhase::NotStarted;
        self.current_index = 0;
        self.answers.clear();
        self.time_left_secs = self.quiz.time_limit_secs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QuizQuestion;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn question(correct: usize) -> QuizQuestion {
        QuizQuestion {
            question: format!("Pick {}", correct),
            options: vec!["0".into(), "1".into(), "2".into(), "3".into()],
            correct_answer: Answer::Choice(correct),
            explanation: None,
        }
    }

    fn quiz(n: usize, time_limit_secs: Option<u32>) -> Quiz {
        Quiz {
            id: Uuid::new_v4(),
            category: "aljabar".into(),
            title: "Persamaan linear".into(),
            time_limit_secs,
            questions: (0..n).map(|i| question(i % 4)).collect(),
        }
    }

    fn started(n: usize, time_limit_secs: Option<u32>) -> QuizSession {
        let mut session = QuizSession::new(quiz(n, time_limit_secs));
        session.start().unwrap();
        session
    }

    #[test]
    fn new_session_is_not_started() {
        let session = QuizSession::new(quiz(3, Some(60)));
        assert_eq!(session.phase(), &QuizPhase::NotStarted);
        assert_eq!(session.time_left_secs(), Some(60));
    }

    #[test]
    fn empty_quiz_cannot_start() {
        let mut session = QuizSession::new(quiz(0, None));
        assert_eq!(session.start(), Err(QuizError::Empty));
    }

    #[test]
    fn answers_require_started_session() {
        let mut session = QuizSession::new(quiz(3, None));
        assert_eq!(
            session.select_answer(0, Answer::Choice(0)),
            Err(QuizError::NotStarted)
        );
    }

    #[test]
    fn navigation_is_bounded() {
        let mut session = started(3, None);
        session.go_prev();
        assert_eq!(session.current_index(), 0);
        session.go_next();
        session.go_next();
        session.go_next();
        assert_eq!(session.current_index(), 2);
        session.go_to(7);
        assert_eq!(session.current_index(), 2);
        session.go_to(1);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn out_of_range_answer_rejected() {
        let mut session = started(2, None);
        assert_eq!(
            session.select_answer(2, Answer::Choice(0)),
            Err(QuizError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert!(session.answers().is_empty());
    }

    #[test]
    fn submit_scores_answers() {
        let mut session = started(4, None);
        session.select_answer(0, Answer::Choice(0)).unwrap();
        session.select_answer(1, Answer::Choice(1)).unwrap();
        session.select_answer(2, Answer::Choice(0)).unwrap();
        let result = session.submit().unwrap();
        assert_eq!(result.score, 2);
        assert_eq!(result.total, 4);
        assert_eq!(result.percent, 50);
        assert_eq!(result.xp, 50);
        assert_eq!(result.reason, SubmitReason::Manual);
    }

    #[test]
    fn empty_submission_is_all_wrong() {
        let mut session = started(3, None);
        let result = session.submit().unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.xp, 30);
    }

    #[test]
    fn score_is_stable_after_submit() {
        let mut session = started(2, None);
        session.select_answer(0, Answer::Choice(0)).unwrap();
        let first = session.submit().unwrap();

        assert_eq!(
            session.select_answer(1, Answer::Choice(1)),
            Err(QuizError::AlreadySubmitted)
        );
        assert_eq!(session.submit().unwrap(), first);
        assert_eq!(session.result(), Some(&first));
    }

    #[test]
    fn timeout_submits_exactly_once() {
        let mut session = started(3, Some(3));
        session.select_answer(0, Answer::Choice(0)).unwrap();
        assert_eq!(session.tick(1), None);
        assert_eq!(session.tick(1), None);

        let result = session.tick(1).expect("timer expired");
        assert_eq!(result.reason, SubmitReason::TimedOut);
        assert_eq!(result.score, 1);
        assert!(session.is_submitted());

        assert_eq!(session.tick(1), None);
        assert_eq!(session.time_left_secs(), Some(0));
    }

    #[test]
    fn untimed_quiz_never_expires() {
        let mut session = started(1, None);
        assert_eq!(session.tick(10_000), None);
        assert!(session.is_in_progress());
    }

    #[test]
    fn tick_before_start_is_ignored() {
        let mut session = QuizSession::new(quiz(1, Some(5)));
        assert_eq!(session.tick(10), None);
        assert_eq!(session.time_left_secs(), Some(5));
    }

    #[test]
    fn reset_allows_reattempt() {
        let mut session = started(2, Some(30));
        session.select_answer(0, Answer::Choice(0)).unwrap();
        session.tick(10);
        session.submit().unwrap();

        session.reset();
        assert_eq!(session.phase(), &QuizPhase::NotStarted);
        assert!(session.answers().is_empty());
        assert_eq!(session.time_left_secs(), Some(30));
        assert_eq!(session.result(), None);
        session.start().unwrap();
        assert!(session.is_in_progress());
    }
}
