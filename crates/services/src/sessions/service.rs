use std::fmt;

use kids_math_core::model::{LevelDescriptor, LevelId, Question, Score, UserId};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── ANSWER OUTCOME ────────────────────────────────────────────────────────────
//

/// What happened when the player picked a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    /// The answer earned a point (correct on the first try).
    pub scored: bool,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One ten-question run through a single level.
///
/// Questions are generated up front. A wrong answer keeps the current
/// question open; only answers correct on the first try count towards the
/// score. Dropping a session discards it without touching storage.
pub struct Session {
    user: UserId,
    level: LevelDescriptor,
    questions: Vec<Question>,
    current: usize,
    correct: u8,
    missed_current: bool,
}

impl Session {
    pub(crate) fn new(user: UserId, level: LevelDescriptor, questions: Vec<Question>) -> Self {
        Self {
            user,
            level,
            questions,
            current: 0,
            correct: 0,
            missed_current: false,
        }
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    #[must_use]
    pub fn level(&self) -> &LevelDescriptor {
        &self.level
    }

    #[must_use]
    pub fn level_id(&self) -> LevelId {
        self.level.id()
    }

    /// The question awaiting an answer, or `None` once every question is done.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// Zero-based index of the current question.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.questions.len()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.current.min(total);
        SessionProgress {
            total,
            answered,
            remaining: total - answered,
            correct: self.correct,
            is_complete: self.is_complete(),
        }
    }

    pub(crate) fn submit(&mut self, value: u32) -> Result<AnswerOutcome, SessionError> {
        let Some(question) = self.current_question() else {
            return Err(SessionError::Completed);
        };

        if !question.is_correct(value) {
            self.missed_current = true;
            return Ok(AnswerOutcome {
                is_correct: false,
                scored: false,
                is_complete: false,
            });
        }

        let scored = !self.missed_current;
        if scored {
            self.correct = self.correct.saturating_add(1);
        }
        self.current += 1;
        self.missed_current = false;

        Ok(AnswerOutcome {
            is_correct: true,
            scored,
            is_complete: self.is_complete(),
        })
    }

    pub(crate) fn score(&self) -> Result<Score, SessionError> {
        if !self.is_complete() {
            return Err(SessionError::Incomplete);
        }
        let total = u8::try_from(self.questions.len()).unwrap_or(u8::MAX);
        Ok(Score::new(self.correct, total)?)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("level", &self.level.id())
            .field("current", &self.current)
            .field("total", &self.questions.len())
            .field("correct", &self.correct)
            .finish_non_exhaustive()
    }
}
