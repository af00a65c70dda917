use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use kids_math_core::generator::generate;
use kids_math_core::model::{LevelId, QUESTIONS_PER_SESSION, Score, Stars, UserId};

use super::service::{AnswerOutcome, Session};
use crate::audio::{AudioCue, AudioCues};
use crate::error::SessionError;
use crate::progress_store::ProgressStore;

/// Final outcome of a completed session, as shown on the result screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub user: UserId,
    pub level: LevelId,
    pub score: Score,
    pub stars: Stars,
    /// The stored best for this level went up.
    pub improved: bool,
    /// Level unlocked by this session, if any.
    pub unlocked: Option<LevelId>,
    /// `false` when saving failed; the other fields are still accurate.
    pub persisted: bool,
    /// The following catalog level, when the player may now start it.
    pub next_level: Option<LevelId>,
}

/// Orchestrates session start, answering and result persistence.
#[derive(Clone)]
pub struct SessionRunner {
    store: ProgressStore,
    audio: Arc<dyn AudioCues>,
}

impl SessionRunner {
    #[must_use]
    pub fn new(store: ProgressStore, audio: Arc<dyn AudioCues>) -> Self {
        Self { store, audio }
    }

    #[must_use]
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Start a ten-question session on `level` for `user`.
    ///
    /// If progress cannot be read, only level 1 is treated as unlocked.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownLevel` for a level outside the catalog
    /// and `SessionError::Locked` for a level the user has not reached.
    pub async fn start<R: Rng + ?Sized>(
        &self,
        user: &UserId,
        level: LevelId,
        rng: &mut R,
    ) -> Result<Session, SessionError> {
        let Some(descriptor) = self.store.catalog().get(level) else {
            return Err(SessionError::UnknownLevel(level));
        };

        let unlocked = match self.store.is_unlocked(user, level).await {
            Ok(unlocked) => unlocked,
            Err(err) => {
                warn!(user = %user, error = %err, "could not read progress, assuming defaults");
                level == LevelId::FIRST
            }
        };
        if !unlocked {
            return Err(SessionError::Locked(level));
        }

        let questions = (0..QUESTIONS_PER_SESSION)
            .map(|_| generate(descriptor, &mut *rng))
            .collect();
        debug!(user = %user, level = %level, "session started");

        Ok(Session::new(user.clone(), descriptor.clone(), questions))
    }

    /// Submit the player's choice for the current question.
    ///
    /// Plays `correct` or `wrong`. A wrong answer leaves the question open.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if every question is already answered.
    pub fn answer(&self, session: &mut Session, value: u32) -> Result<AnswerOutcome, SessionError> {
        let outcome = session.submit(value)?;
        self.audio.play(if outcome.is_correct {
            AudioCue::Correct
        } else {
            AudioCue::Wrong
        });
        debug!(
            level = %session.level_id(),
            value,
            correct = outcome.is_correct,
            scored = outcome.scored,
            "answer submitted"
        );
        Ok(outcome)
    }

    /// Score a completed session and save it.
    ///
    /// Saving is best effort: a storage failure is logged and reported through
    /// `SessionResult::persisted`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` if questions remain unanswered.
    pub async fn finish(&self, session: Session) -> Result<SessionResult, SessionError> {
        let score = session.score()?;
        let level = session.level_id();
        let user = session.user().clone();
        let stars = Stars::for_score(score);

        if score.is_perfect() {
            self.audio.play(AudioCue::Fanfare);
        } else if stars.is_clear() {
            self.audio.play(AudioCue::Correct);
        }

        let (improved, unlocked, persisted) = match self.store.apply_score(&user, level, score).await {
            Ok(outcome) => (outcome.improved, outcome.unlocked, true),
            Err(err) => {
                warn!(user = %user, level = %level, error = %err, "failed to save session result");
                (false, None, false)
            }
        };

        let next_level = match level.next().filter(|next| self.store.catalog().contains(*next)) {
            Some(next) if unlocked == Some(next) => Some(next),
            Some(next) => self
                .store
                .is_unlocked(&user, next)
                .await
                .unwrap_or(false)
                .then_some(next),
            None => None,
        };

        Ok(SessionResult {
            user,
            level,
            score,
            stars,
            improved,
            unlocked,
            persisted,
            next_level,
        })
    }
}
