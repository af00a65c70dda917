//! Profile operations on `ProgressStore`.

use tracing::{info, warn};

use kids_math_core::model::{ProfileDraft, UserId, UserProfile};
use storage::keys;
use storage::repository::KvWrite;

use crate::error::ProgressError;
use crate::progress_store::ProgressStore;

impl ProgressStore {
    /// All registered profiles, oldest first. An unreadable list is treated
    /// as empty.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the backend cannot be read.
    pub async fn list_users(&self) -> Result<Vec<UserProfile>, ProgressError> {
        let Some(raw) = self.kv.get(keys::USERS).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(users) => Ok(users),
            Err(err) => {
                warn!(error = %err, "malformed user list, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the backend cannot be read.
    pub async fn find_user(&self, id: &UserId) -> Result<Option<UserProfile>, ProgressError> {
        Ok(self
            .list_users()
            .await?
            .into_iter()
            .find(|user| user.id() == id))
    }

    /// Validate and store a new profile, and make it the current user.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Profile` for an invalid draft, or a storage
    /// error if the profile cannot be saved.
    pub async fn register_user(&self, draft: ProfileDraft) -> Result<UserProfile, ProgressError> {
        let profile = draft.validate(self.clock.now())?;

        let mut users = self.list_users().await?;
        users.push(profile.clone());
        let encoded = serde_json::to_string(&users)?;

        self.kv
            .write_batch(&[
                KvWrite::set(keys::USERS, encoded),
                KvWrite::set(keys::CURRENT_USER_ID, profile.id().as_str()),
            ])
            .await?;

        info!(user = %profile.id(), "registered user");
        Ok(profile)
    }

    /// Point the current-user marker at an existing profile.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownUser` if no profile has this id.
    pub async fn set_current_user(&self, id: &UserId) -> Result<UserProfile, ProgressError> {
        let Some(profile) = self.find_user(id).await? else {
            return Err(ProgressError::UnknownUser(id.clone()));
        };
        self.kv.set(keys::CURRENT_USER_ID, id.as_str()).await?;
        Ok(profile)
    }

    /// The profile the current-user marker points at, if it still exists.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the backend cannot be read.
    pub async fn current_user(&self) -> Result<Option<UserProfile>, ProgressError> {
        let Some(raw) = self.kv.get(keys::CURRENT_USER_ID).await? else {
            return Ok(None);
        };
        let Ok(id) = raw.parse::<UserId>() else {
            return Ok(None);
        };
        self.find_user(&id).await
    }

    /// Remove a profile together with its progress.
    ///
    /// The profile entry, the progress record and (when it names this user)
    /// the current-user marker go in one atomic batch. The progress record is
    /// removed even when the profile list no longer has the id. Returns
    /// `false` when there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the batch fails; nothing is removed then.
    pub async fn delete_user(&self, id: &UserId) -> Result<bool, ProgressError> {
        let users = self.list_users().await?;
        let before = users.len();
        let remaining: Vec<UserProfile> = users.into_iter().filter(|user| user.id() != id).collect();
        let had_profile = remaining.len() != before;

        let progress_key = keys::progress(id);
        let had_progress = self.kv.get(&progress_key).await?.is_some();
        let was_current =
            self.kv.get(keys::CURRENT_USER_ID).await?.as_deref() == Some(id.as_str());

        if !(had_profile || had_progress || was_current) {
            return Ok(false);
        }

        let mut writes = Vec::with_capacity(3);
        if had_profile {
            writes.push(KvWrite::set(keys::USERS, serde_json::to_string(&remaining)?));
        }
        writes.push(KvWrite::remove(progress_key));
        if was_current {
            writes.push(KvWrite::remove(keys::CURRENT_USER_ID));
        }

        self.kv.write_batch(&writes).await?;
        info!(user = %id, profile = had_profile, "deleted user");
        Ok(true)
    }
}
