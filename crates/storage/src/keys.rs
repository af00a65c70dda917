//! Key layout of the persisted game state.
//!
//! The names match what the browser build wrote to local storage, so an
//! exported dump can be loaded as-is.

use kids_math_core::model::UserId;

/// JSON array of every registered profile.
pub const USERS: &str = "kidsMath_users";

/// Id of the profile that is currently playing.
pub const CURRENT_USER_ID: &str = "kidsMath_currentUserId";

const PROGRESS_PREFIX: &str = "kidsMath_progress_";

/// Key of one user's progress record.
#[must_use]
pub fn progress(user: &UserId) -> String {
    format!("{PROGRESS_PREFIX}{user}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_key_embeds_user_id() {
        let user: UserId = "1700000000000".parse().unwrap();
        assert_eq!(progress(&user), "kidsMath_progress_1700000000000");
    }
}
