//! Provider API keys: at most one per provider and user

use serde::{Deserialize, Serialize};

use super::{validate_text, ResourceKind};
use crate::db::TableSet;
use crate::models::{OwnerScope, Record, ValidationError};

const MAX_PROVIDER_LEN: usize = 100;
const MAX_KEY_LEN: usize = 1_000;

pub struct ApiKeys;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyBody {
    pub provider: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiKeyPatch {
    pub api_key: Option<String>,
}

pub type ApiKey = Record<ApiKeyBody>;

/// Natural key for the (user, provider) pair. Providers never contain
/// `/`, so the key splits back on its last separator.
pub fn provider_key(user_id: &str, provider: &str) -> String {
    format!("{}/{}", user_id, provider.trim().to_lowercase())
}

impl ResourceKind for ApiKeys {
    const NAME: &'static str = "API key";
    const TABLES: TableSet = TableSet {
        records: "api_keys",
        ledger: "api_keys_update_ledger",
        tags: "api_keys_tags",
    };

    type Body = ApiKeyBody;
    type Patch = ApiKeyPatch;

    fn validate(body: &Self::Body) -> Result<(), ValidationError> {
        validate_text("provider", &body.provider, MAX_PROVIDER_LEN)?;
        if body.provider.contains('/') {
            return Err(ValidationError::InvalidFormat {
                field: "provider",
                reason: "must not contain '/'",
            });
        }
        validate_text("api key", &body.api_key, MAX_KEY_LEN)
    }

    // Provider is fixed at creation; only the secret rotates
    fn apply_patch(body: &mut Self::Body, patch: Self::Patch) {
        if let Some(api_key) = patch.api_key {
            body.api_key = api_key;
        }
    }

    fn natural_key(scope: &OwnerScope, body: &Self::Body) -> Option<String> {
        Some(provider_key(&scope.user_id, &body.provider))
    }
}
