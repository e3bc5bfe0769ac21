//! Resource kinds served by the generic store
//!
//! A kind names its tables, owns the typed body stored in the `payload`
//! column, and decides how a field-level patch applies to that body.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::TableSet;
use crate::models::{OwnerScope, ValidationError};

pub mod api_key;
pub mod data_packet;
pub mod profile;
pub mod user;

pub use api_key::{ApiKey, ApiKeyBody, ApiKeyPatch, ApiKeys};
pub use data_packet::{DataPacket, DataPacketBody, DataPacketPatch, DataPackets};
pub use profile::{Profile, ProfileBody, ProfilePatch, Profiles};
pub use user::{User, UserBody, UserPatch, Users};

pub trait ResourceKind: Send + Sync + 'static {
    /// Human-readable name used in errors and logs
    const NAME: &'static str;
    const TABLES: TableSet;
    /// Whether the owning scope must carry a profile id
    const REQUIRES_PROFILE: bool = false;

    type Body: Serialize + DeserializeOwned + Clone + fmt::Debug + PartialEq + Send;
    /// Field-level partial update; absent fields stay untouched
    type Patch: DeserializeOwned + Default + fmt::Debug + Send;

    fn validate(_body: &Self::Body) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Extra constraints tying the record id to its scope
    fn check_scope(_id: &str, _scope: &OwnerScope) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Id implied by the owning scope, for kinds whose records own themselves
    fn derived_id(_scope: &OwnerScope) -> Option<String> {
        None
    }

    fn apply_patch(body: &mut Self::Body, patch: Self::Patch);

    /// Globally unique key derived from the record, if the kind has one
    fn natural_key(_scope: &OwnerScope, _body: &Self::Body) -> Option<String> {
        None
    }
}

/// Table sets of every shipped kind, in bootstrap order
pub const ALL_TABLES: [TableSet; 4] = [
    Users::TABLES,
    Profiles::TABLES,
    DataPackets::TABLES,
    ApiKeys::TABLES,
];

pub(crate) fn validate_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
