//! User accounts
//!
//! A user owns itself: its scope's `user_id` must equal its id. The
//! password hash is stored opaquely; hashing happens in the caller.

use serde::{Deserialize, Serialize};

use super::{validate_text, ResourceKind};
use crate::db::TableSet;
use crate::models::{OwnerScope, Record, ValidationError};

const MAX_EMAIL_LEN: usize = 254;
const MAX_NAME_LEN: usize = 100;

pub struct Users;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBody {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: Option<String>,
}

pub type User = Record<UserBody>;

/// Normalized form used for uniqueness and lookup
pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl ResourceKind for Users {
    const NAME: &'static str = "user";
    const TABLES: TableSet = TableSet {
        records: "users",
        ledger: "users_update_ledger",
        tags: "users_tags",
    };

    type Body = UserBody;
    type Patch = UserPatch;

    fn validate(body: &Self::Body) -> Result<(), ValidationError> {
        validate_text("email", &body.email, MAX_EMAIL_LEN)?;
        match body.email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => {
                return Err(ValidationError::InvalidFormat {
                    field: "email",
                    reason: "must look like name@domain",
                })
            }
        }
        for (field, value) in [
            ("first name", &body.first_name),
            ("last name", &body.last_name),
        ] {
            if let Some(value) = value {
                validate_text(field, value, MAX_NAME_LEN)?;
            }
        }
        if body.password_hash.is_empty() {
            return Err(ValidationError::Empty {
                field: "password hash",
            });
        }
        Ok(())
    }

    fn check_scope(id: &str, scope: &OwnerScope) -> Result<(), ValidationError> {
        if scope.user_id != id || scope.profile_id.is_some() {
            return Err(ValidationError::Inconsistent {
                reason: format!("user '{}' must be owned by itself", id),
            });
        }
        Ok(())
    }

    fn derived_id(scope: &OwnerScope) -> Option<String> {
        Some(scope.user_id.clone())
    }

    fn apply_patch(body: &mut Self::Body, patch: Self::Patch) {
        if let Some(email) = patch.email {
            body.email = email;
        }
        if let Some(first_name) = patch.first_name {
            body.first_name = Some(first_name);
        }
        if let Some(last_name) = patch.last_name {
            body.last_name = Some(last_name);
        }
        if let Some(password_hash) = patch.password_hash {
            body.password_hash = password_hash;
        }
    }

    fn natural_key(_scope: &OwnerScope, body: &Self::Body) -> Option<String> {
        Some(email_key(&body.email))
    }
}
