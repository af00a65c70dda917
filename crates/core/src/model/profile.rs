use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("name is too long ({len} > {max} characters)")]
    NameTooLong { len: usize, max: usize },

    #[error("age must be between {min} and {max}, got {age}")]
    InvalidAge { age: u8, min: u8, max: u8 },
}

/// Unvalidated registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    pub name: String,
    pub age: u8,
}

impl ProfileDraft {
    pub const MAX_NAME_CHARS: usize = 20;
    pub const MIN_AGE: u8 = 2;
    pub const MAX_AGE: u8 = 9;

    #[must_use]
    pub fn new(name: impl Into<String>, age: u8) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }

    /// Validate the draft and mint a profile with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if the trimmed name is empty or too long, or the
    /// age is outside the supported range.
    pub fn validate(self, created_at: DateTime<Utc>) -> Result<UserProfile, ProfileError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let len = name.chars().count();
        if len > Self::MAX_NAME_CHARS {
            return Err(ProfileError::NameTooLong {
                len,
                max: Self::MAX_NAME_CHARS,
            });
        }
        if !(Self::MIN_AGE..=Self::MAX_AGE).contains(&self.age) {
            return Err(ProfileError::InvalidAge {
                age: self.age,
                min: Self::MIN_AGE,
                max: Self::MAX_AGE,
            });
        }

        Ok(UserProfile {
            id: UserId::generate(),
            name,
            age: self.age,
            created_at: Some(created_at),
        })
    }
}

/// A registered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    id: UserId,
    name: String,
    age: u8,
    /// Missing on profiles written before timestamps were recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn age(&self) -> u8 {
        self.age
    }

    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn validate_trims_name() {
        let profile = ProfileDraft::new("  はなこ ", 4).validate(fixed_now()).unwrap();
        assert_eq!(profile.name(), "はなこ");
        assert_eq!(profile.age(), 4);
        assert_eq!(profile.created_at(), Some(fixed_now()));
    }

    #[test]
    fn validate_rejects_blank_name() {
        let err = ProfileDraft::new("   ", 4).validate(fixed_now()).unwrap_err();
        assert_eq!(err, ProfileError::EmptyName);
    }

    #[test]
    fn validate_counts_characters_not_bytes() {
        let name = "あ".repeat(20);
        assert!(ProfileDraft::new(name, 5).validate(fixed_now()).is_ok());
        let err = ProfileDraft::new("あ".repeat(21), 5)
            .validate(fixed_now())
            .unwrap_err();
        assert_eq!(err, ProfileError::NameTooLong { len: 21, max: 20 });
    }

    #[test]
    fn validate_rejects_age_out_of_range() {
        let err = ProfileDraft::new("taro", 12).validate(fixed_now()).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidAge { age: 12, .. }));
    }

    #[test]
    fn reads_profiles_without_timestamp() {
        let json = r#"{"id":"1700000000000","name":"taro","age":5}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id().as_str(), "1700000000000");
        assert_eq!(profile.created_at(), None);
    }
}
