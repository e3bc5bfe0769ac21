//! Resource record shapes shared by every kind

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OwnerScope, Tags};

/// A stored resource. `B` is the kind-specific body, persisted as the
/// `payload` JSON column and flattened into the serialized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<B> {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    pub create_timestamp: DateTime<Utc>,
    pub update_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(flatten)]
    pub body: B,
}

impl<B> Record<B> {
    pub fn scope(&self) -> OwnerScope {
        OwnerScope {
            user_id: self.user_id.clone(),
            profile_id: self.profile_id.clone(),
        }
    }
}

/// Candidate record handed to Create.
#[derive(Debug, Clone)]
pub struct NewRecord<B> {
    pub id: String,
    pub scope: OwnerScope,
    /// `None` leaves the tag column NULL and the index untouched
    pub tags: Option<Tags>,
    pub body: B,
    /// Defaults to the store clock
    pub create_timestamp: Option<DateTime<Utc>>,
}

impl<B> NewRecord<B> {
    pub fn new(id: impl Into<String>, scope: OwnerScope, body: B) -> Self {
        Self {
            id: id.into(),
            scope,
            tags: None,
            body,
            create_timestamp: None,
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn created_at(mut self, ts: DateTime<Utc>) -> Self {
        self.create_timestamp = Some(ts);
        self
    }
}

/// Partial update. Every `Some` field replaces the stored value wholesale;
/// `None` leaves it untouched. `P` is the kind's field-level patch.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch<P> {
    pub tags: Option<Tags>,
    pub fields: P,
    /// Defaults to the store clock
    pub update_timestamp: Option<DateTime<Utc>>,
}

impl<P: Default> RecordPatch<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(fields: P) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn updated_at(mut self, ts: DateTime<Utc>) -> Self {
        self.update_timestamp = Some(ts);
        self
    }
}
