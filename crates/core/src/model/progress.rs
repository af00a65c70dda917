use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::LevelId;

/// Questions asked in one session.
pub const QUESTIONS_PER_SESSION: u8 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("a score needs at least one question")]
    NoQuestions,

    #[error("correct answers ({correct}) exceed questions ({total})")]
    TooManyCorrect { correct: u8, total: u8 },
}

//
// ─── SCORE & STARS ─────────────────────────────────────────────────────────────
//

/// Outcome of a finished session: first-try correct answers out of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    correct: u8,
    total: u8,
}

impl Score {
    /// # Errors
    ///
    /// Returns `ScoreError` if `total` is zero or `correct > total`.
    pub fn new(correct: u8, total: u8) -> Result<Self, ScoreError> {
        if total == 0 {
            return Err(ScoreError::NoQuestions);
        }
        if correct > total {
            return Err(ScoreError::TooManyCorrect { correct, total });
        }
        Ok(Self { correct, total })
    }

    /// Score out of a standard ten-question session.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::TooManyCorrect` if `correct > 10`.
    pub fn out_of_session(correct: u8) -> Result<Self, ScoreError> {
        Self::new(correct, QUESTIONS_PER_SESSION)
    }

    #[must_use]
    pub fn correct(&self) -> u8 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u8 {
        self.total
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.correct == self.total
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.correct, self.total)
    }
}

/// Star tier `0..=3` summarising a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    pub const NONE: Stars = Stars(0);
    pub const MAX: Stars = Stars(3);

    /// Threshold table:
    /// all correct → 3, at least 70% → 2, at least one → 1, none → 0.
    #[must_use]
    pub fn for_score(score: Score) -> Self {
        let correct = u32::from(score.correct);
        let total = u32::from(score.total);
        if score.is_perfect() {
            Stars(3)
        } else if correct * 10 >= total * 7 {
            Stars(2)
        } else if correct >= 1 {
            Stars(1)
        } else {
            Stars(0)
        }
    }

    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX.0).then_some(Self(value))
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// At least one star clears the level.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.0 >= 1
    }
}

impl TryFrom<u8> for Stars {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Stars::new(value).ok_or_else(|| format!("stars must be 0..=3, got {value}"))
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> Self {
        stars.0
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Best result a user has reached on one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelBest {
    pub stars: Stars,
    pub score: u8,
}

/// Where a level sits in its `Locked → Unlocked → Cleared` lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    Locked,
    Unlocked,
    Cleared(Stars),
}

/// What `ProgressRecord::apply_result` computed and changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultOutcome {
    /// Tier earned by this attempt, whether or not it beat the stored best.
    pub stars: Stars,
    /// The stored best for the level was raised.
    pub improved: bool,
    /// The level newly unlocked by this attempt.
    pub unlocked: Option<LevelId>,
}

impl ResultOutcome {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.improved || self.unlocked.is_some()
    }
}

/// Per-user unlock frontier and best results.
///
/// The frontier only moves forward and stored stars only go up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    max_unlocked_level: LevelId,
    #[serde(default)]
    levels: BTreeMap<LevelId, LevelBest>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            max_unlocked_level: LevelId::FIRST,
            levels: BTreeMap::new(),
        }
    }
}

impl ProgressRecord {
    /// Rebuilds a record from the bare `level → stars` map older builds wrote.
    ///
    /// Out-of-range star values are dropped. The frontier is one past the run
    /// of consecutively cleared levels starting at level 1, capped at
    /// `last_level`.
    #[must_use]
    pub fn from_legacy_stars(stars: &BTreeMap<LevelId, u8>, last_level: LevelId) -> Self {
        let levels: BTreeMap<LevelId, LevelBest> = stars
            .iter()
            .filter_map(|(level, value)| {
                Stars::new(*value).map(|stars| (*level, LevelBest { stars, score: 0 }))
            })
            .collect();

        let mut frontier = LevelId::FIRST;
        while frontier < last_level {
            let cleared = levels
                .get(&frontier)
                .is_some_and(|best| best.stars.is_clear());
            match frontier.next() {
                Some(next) if cleared => frontier = next,
                _ => break,
            }
        }

        Self {
            max_unlocked_level: frontier,
            levels,
        }
    }

    #[must_use]
    pub fn max_unlocked_level(&self) -> LevelId {
        self.max_unlocked_level
    }

    #[must_use]
    pub fn is_unlocked(&self, level: LevelId) -> bool {
        level <= self.max_unlocked_level
    }

    #[must_use]
    pub fn best(&self, level: LevelId) -> Option<LevelBest> {
        self.levels.get(&level).copied()
    }

    #[must_use]
    pub fn stars(&self, level: LevelId) -> Stars {
        self.best(level).map(|best| best.stars).unwrap_or_default()
    }

    #[must_use]
    pub fn level_state(&self, level: LevelId) -> LevelState {
        let stars = self.stars(level);
        if stars.is_clear() {
            LevelState::Cleared(stars)
        } else if self.is_unlocked(level) {
            LevelState::Unlocked
        } else {
            LevelState::Locked
        }
    }

    pub fn levels(&self) -> impl Iterator<Item = (LevelId, LevelBest)> + '_ {
        self.levels.iter().map(|(id, best)| (*id, *best))
    }

    /// Applies one finished session to the record.
    ///
    /// The stored best is raised only when the new score beats it. Clearing
    /// the frontier level (at least one star) unlocks the next one, unless it
    /// is `last_level`. Replaying a level behind the frontier never moves it.
    pub fn apply_result(&mut self, level: LevelId, score: Score, last_level: LevelId) -> ResultOutcome {
        let stars = Stars::for_score(score);

        let current = self.best(level).unwrap_or_default();
        let improved = score.correct > current.score || stars > current.stars;
        if improved {
            self.levels.insert(
                level,
                LevelBest {
                    stars: stars.max(current.stars),
                    score: score.correct.max(current.score),
                },
            );
        }

        let mut unlocked = None;
        if stars.is_clear() && level == self.max_unlocked_level && level < last_level {
            if let Some(next) = level.next() {
                self.max_unlocked_level = next;
                unlocked = Some(next);
            }
        }

        ResultOutcome {
            stars,
            improved,
            unlocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(correct: u8) -> Score {
        Score::out_of_session(correct).unwrap()
    }

    fn last() -> LevelId {
        LevelId::new(12)
    }

    #[test]
    fn star_thresholds_for_ten_questions() {
        let tiers: Vec<u8> = (0..=10).map(|c| Stars::for_score(score(c)).value()).collect();
        assert_eq!(tiers, vec![0, 1, 1, 1, 1, 1, 1, 2, 2, 2, 3]);
    }

    #[test]
    fn score_rejects_impossible_values() {
        assert_eq!(
            Score::out_of_session(11),
            Err(ScoreError::TooManyCorrect {
                correct: 11,
                total: 10
            })
        );
        assert_eq!(Score::new(0, 0), Err(ScoreError::NoQuestions));
    }

    #[test]
    fn default_record_unlocks_only_level_one() {
        let record = ProgressRecord::default();
        assert_eq!(record.max_unlocked_level(), LevelId::FIRST);
        assert_eq!(record.level_state(LevelId::new(1)), LevelState::Unlocked);
        assert_eq!(record.level_state(LevelId::new(2)), LevelState::Locked);
    }

    #[test]
    fn perfect_clear_unlocks_next_and_stores_three_stars() {
        let mut record = ProgressRecord::default();
        let outcome = record.apply_result(LevelId::new(1), score(10), last());

        assert_eq!(outcome.stars, Stars::MAX);
        assert!(outcome.improved);
        assert_eq!(outcome.unlocked, Some(LevelId::new(2)));
        assert_eq!(record.stars(LevelId::new(1)), Stars::MAX);
        assert_eq!(record.max_unlocked_level(), LevelId::new(2));
    }

    #[test]
    fn worse_replay_keeps_best() {
        let mut record = ProgressRecord::default();
        record.apply_result(LevelId::new(1), score(10), last());

        let outcome = record.apply_result(LevelId::new(1), score(4), last());

        assert_eq!(outcome.stars.value(), 1);
        assert!(!outcome.improved);
        assert_eq!(outcome.unlocked, None);
        assert_eq!(record.stars(LevelId::new(1)), Stars::MAX);
        assert_eq!(record.best(LevelId::new(1)).unwrap().score, 10);
        assert_eq!(record.max_unlocked_level(), LevelId::new(2));
    }

    #[test]
    fn zero_score_does_not_unlock() {
        let mut record = ProgressRecord::default();
        let outcome = record.apply_result(LevelId::new(1), score(0), last());

        assert_eq!(outcome.stars, Stars::NONE);
        assert!(!outcome.changed());
        assert_eq!(record.max_unlocked_level(), LevelId::FIRST);
        assert_eq!(record.level_state(LevelId::new(1)), LevelState::Unlocked);
    }

    #[test]
    fn replay_behind_frontier_does_not_advance() {
        let mut record = ProgressRecord::default();
        record.apply_result(LevelId::new(1), score(5), last());
        record.apply_result(LevelId::new(2), score(5), last());
        assert_eq!(record.max_unlocked_level(), LevelId::new(3));

        let outcome = record.apply_result(LevelId::new(1), score(10), last());
        assert!(outcome.improved);
        assert_eq!(outcome.unlocked, None);
        assert_eq!(record.max_unlocked_level(), LevelId::new(3));
    }

    #[test]
    fn last_level_does_not_unlock_beyond_catalog() {
        let mut record = ProgressRecord::default();
        for level in 1..=12 {
            record.apply_result(LevelId::new(level), score(8), last());
        }
        assert_eq!(record.max_unlocked_level(), last());
        assert_eq!(record.level_state(last()), LevelState::Cleared(Stars::new(2).unwrap()));
    }

    #[test]
    fn stars_never_decrease_over_any_sequence() {
        let mut record = ProgressRecord::default();
        let mut best = Stars::NONE;
        for correct in [3, 9, 0, 10, 1, 7, 10, 2] {
            let outcome = record.apply_result(LevelId::new(1), score(correct), last());
            best = best.max(outcome.stars);
            assert_eq!(record.stars(LevelId::new(1)), best);
        }
    }

    #[test]
    fn legacy_map_derives_frontier() {
        let mut legacy = BTreeMap::new();
        legacy.insert(LevelId::new(1), 3);
        legacy.insert(LevelId::new(2), 1);
        legacy.insert(LevelId::new(4), 2);
        legacy.insert(LevelId::new(5), 9);

        let record = ProgressRecord::from_legacy_stars(&legacy, last());

        assert_eq!(record.max_unlocked_level(), LevelId::new(3));
        assert_eq!(record.stars(LevelId::new(4)).value(), 2);
        assert!(record.best(LevelId::new(5)).is_none());
    }

    #[test]
    fn record_json_shape() {
        let mut record = ProgressRecord::default();
        record.apply_result(LevelId::new(1), score(10), last());
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"maxUnlockedLevel":2,"levels":{"1":{"stars":3,"score":10}}}"#
        );
        let back: ProgressRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn out_of_range_stars_fail_to_deserialize() {
        let json = r#"{"maxUnlockedLevel":1,"levels":{"1":{"stars":7,"score":10}}}"#;
        assert!(serde_json::from_str::<ProgressRecord>(json).is_err());
    }
}
