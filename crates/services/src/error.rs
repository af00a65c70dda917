//! Shared error types for the services crate.

use thiserror::Error;

use kids_math_core::model::{LevelId, ProfileError, ScoreError, UserId};
use storage::repository::StorageError;

/// Errors emitted by `ProgressStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("unknown level {0}")]
    UnknownLevel(LevelId),
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("unknown level {0}")]
    UnknownLevel(LevelId),
    #[error("level {0} is locked")]
    Locked(LevelId),
    #[error("session already completed")]
    Completed,
    #[error("session still has unanswered questions")]
    Incomplete,
    #[error(transparent)]
    Score(#[from] ScoreError),
}
