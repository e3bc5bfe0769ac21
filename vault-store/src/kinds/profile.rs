//! Profiles: named personas under a user account

use serde::{Deserialize, Serialize};

use super::{validate_text, ResourceKind};
use crate::db::TableSet;
use crate::models::{Record, ValidationError};

const MAX_NAME_LEN: usize = 100;

pub struct Profiles;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileBody {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilePatch {
    pub name: Option<String>,
}

pub type Profile = Record<ProfileBody>;

impl ResourceKind for Profiles {
    const NAME: &'static str = "profile";
    const TABLES: TableSet = TableSet {
        records: "profiles",
        ledger: "profiles_update_ledger",
        tags: "profiles_tags",
    };

    type Body = ProfileBody;
    type Patch = ProfilePatch;

    fn validate(body: &Self::Body) -> Result<(), ValidationError> {
        validate_text("profile name", &body.name, MAX_NAME_LEN)
    }

    fn apply_patch(body: &mut Self::Body, patch: Self::Patch) {
        if let Some(name) = patch.name {
            body.name = name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        let ok = ProfileBody { name: "Work".into() };
        assert!(Profiles::validate(&ok).is_ok());

        let blank = ProfileBody { name: " ".into() };
        assert!(matches!(
            Profiles::validate(&blank),
            Err(ValidationError::Empty { .. })
        ));

        let long = ProfileBody {
            name: "n".repeat(MAX_NAME_LEN + 1),
        };
        assert!(matches!(
            Profiles::validate(&long),
            Err(ValidationError::TooLong { .. })
        ));
    }
}
