use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use kids_math_core::Clock;
use kids_math_core::model::{
    LevelCatalog, LevelId, LevelState, ProgressRecord, ResultOutcome, Score, Stars, UserId,
};
use storage::keys;
use storage::repository::KeyValueStore;

use crate::error::ProgressError;

/// Per-user progress and profiles over a string key-value backend.
///
/// Cloning is cheap; clones share the backend and catalog.
#[derive(Clone)]
pub struct ProgressStore {
    pub(crate) kv: Arc<dyn KeyValueStore>,
    catalog: Arc<LevelCatalog>,
    pub(crate) clock: Clock,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, catalog: Arc<LevelCatalog>, clock: Clock) -> Self {
        Self { kv, catalog, clock }
    }

    #[must_use]
    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    /// Load the stored record for `user`.
    ///
    /// A missing or unreadable record yields the default (only level 1
    /// unlocked, no stars).
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the backend cannot be read.
    pub async fn load(&self, user: &UserId) -> Result<ProgressRecord, ProgressError> {
        let key = keys::progress(user);
        let Some(raw) = self.kv.get(&key).await? else {
            return Ok(ProgressRecord::default());
        };
        Ok(self.decode(user, &raw))
    }

    /// Record a finished session and return the stars it earned.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLevel` for a level outside the catalog,
    /// or `ProgressError::Storage`/`Encode` if the update cannot be saved.
    pub async fn record_result(
        &self,
        user: &UserId,
        level: LevelId,
        score: Score,
    ) -> Result<Stars, ProgressError> {
        self.apply_score(user, level, score)
            .await
            .map(|outcome| outcome.stars)
    }

    /// Record a finished session and report what changed.
    ///
    /// Nothing is written when neither the best result nor the frontier moved.
    ///
    /// # Errors
    ///
    /// Same as [`ProgressStore::record_result`].
    pub async fn apply_score(
        &self,
        user: &UserId,
        level: LevelId,
        score: Score,
    ) -> Result<ResultOutcome, ProgressError> {
        if !self.catalog.contains(level) {
            return Err(ProgressError::UnknownLevel(level));
        }

        let mut record = self.load(user).await?;
        let outcome = record.apply_result(level, score, self.catalog.last_level());

        if outcome.changed() {
            let encoded = serde_json::to_string(&record)?;
            self.kv.set(&keys::progress(user), &encoded).await?;
        }

        debug!(
            user = %user,
            level = %level,
            score = %score,
            stars = outcome.stars.value(),
            improved = outcome.improved,
            "recorded session result"
        );
        if let Some(next) = outcome.unlocked {
            info!(user = %user, level = %next, "unlocked level");
        }

        Ok(outcome)
    }

    /// Whether `user` may play `level`. Levels outside the catalog are never
    /// unlocked.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the backend cannot be read.
    pub async fn is_unlocked(&self, user: &UserId, level: LevelId) -> Result<bool, ProgressError> {
        if !self.catalog.contains(level) {
            return Ok(false);
        }
        Ok(self.load(user).await?.is_unlocked(level))
    }

    /// State of every catalog level for `user`, in level order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the backend cannot be read.
    pub async fn level_states(
        &self,
        user: &UserId,
    ) -> Result<Vec<(LevelId, LevelState)>, ProgressError> {
        let record = self.load(user).await?;
        Ok(self
            .catalog
            .iter()
            .map(|level| (level.id(), record.level_state(level.id())))
            .collect())
    }

    fn decode(&self, user: &UserId, raw: &str) -> ProgressRecord {
        match serde_json::from_str::<ProgressRecord>(raw) {
            Ok(record) if record.max_unlocked_level() >= LevelId::FIRST => return record,
            Ok(_) => {
                warn!(user = %user, "stored progress has no valid frontier, using default");
                return ProgressRecord::default();
            }
            Err(_) => {}
        }

        match serde_json::from_str::<BTreeMap<LevelId, u8>>(raw) {
            Ok(stars) => {
                debug!(user = %user, "upgrading legacy progress record");
                ProgressRecord::from_legacy_stars(&stars, self.catalog.last_level())
            }
            Err(err) => {
                warn!(user = %user, error = %err, "malformed progress record, using default");
                ProgressRecord::default()
            }
        }
    }
}
