//! Owning scope: the fields that partition records for access control

use serde::{Deserialize, Serialize};

use super::validation::{validate_id, ValidationError};

/// Owner of a record. `user_id` is never empty; `profile_id` is present
/// for kinds that are partitioned per profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerScope {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

impl OwnerScope {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            profile_id: None,
        }
    }

    pub fn profile(user_id: impl Into<String>, profile_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            profile_id: Some(profile_id.into()),
        }
    }

    pub fn validate(&self, requires_profile: bool) -> Result<(), ValidationError> {
        validate_id("user id", &self.user_id)?;
        match &self.profile_id {
            Some(profile_id) => validate_id("profile id", profile_id),
            None if requires_profile => Err(ValidationError::Empty {
                field: "profile id",
            }),
            None => Ok(()),
        }
    }

    /// True when `other` falls inside this scope. A scope without a profile
    /// covers every profile of the user.
    pub fn covers(&self, other: &OwnerScope) -> bool {
        self.user_id == other.user_id
            && match &self.profile_id {
                Some(profile_id) => other.profile_id.as_deref() == Some(profile_id.as_str()),
                None => true,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_requirement() {
        assert!(OwnerScope::user("u1").validate(false).is_ok());
        assert!(matches!(
            OwnerScope::user("u1").validate(true),
            Err(ValidationError::Empty { field: "profile id" })
        ));
        assert!(OwnerScope::profile("u1", "p1").validate(true).is_ok());
        assert!(OwnerScope::user("").validate(false).is_err());
    }

    #[test]
    fn user_scope_covers_all_profiles() {
        let user = OwnerScope::user("u1");
        assert!(user.covers(&OwnerScope::profile("u1", "a")));
        assert!(!user.covers(&OwnerScope::profile("u2", "a")));

        let profile = OwnerScope::profile("u1", "a");
        assert!(profile.covers(&OwnerScope::profile("u1", "a")));
        assert!(!profile.covers(&OwnerScope::profile("u1", "b")));
        assert!(!profile.covers(&OwnerScope::user("u1")));
    }
}
