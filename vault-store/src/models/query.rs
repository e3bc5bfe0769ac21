//! List query parameters

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::validation::{validate_id, validate_timestamp};
use super::{Tags, ValidationError};

/// Maximum items per page
pub const MAX_LIMIT: u32 = 100;

/// Default items per page
pub const DEFAULT_LIMIT: u32 = 50;

static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}(\.[A-Za-z_][A-Za-z0-9_]{0,63}){0,7}$")
        .expect("invalid field regex")
});

/// Sort direction applied to `create_timestamp`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ValidationError::InvalidVariant {
                field: "sort order",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// Scalar compared against a top-level payload field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Bool(bool),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Equality filter on a payload field. `field` is a dotted path such as
/// `provider` or `data.status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFilter {
    pub field: String,
    pub value: FieldValue,
}

/// Filter, sort, and pagination options for List.
///
/// `user_id` is mandatory. Multiple tags are AND-ed: a record must carry
/// every listed tag. The time range is inclusive on `create_timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub user_id: String,
    pub profile_id: Option<String>,
    pub tags: Vec<String>,
    pub from_timestamp: Option<DateTime<Utc>>,
    pub to_timestamp: Option<DateTime<Utc>>,
    pub payload_filters: Vec<PayloadFilter>,
    pub limit: u32,
    pub offset: u32,
    pub sort_order: SortOrder,
}

impl ListQuery {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            profile_id: None,
            tags: Vec::new(),
            from_timestamp: None,
            to_timestamp: None,
            payload_filters: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort_order: SortOrder::default(),
        }
    }

    pub fn profile(mut self, profile_id: impl Into<String>) -> Self {
        self.profile_id = Some(profile_id.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn from(mut self, ts: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(ts);
        self
    }

    pub fn to(mut self, ts: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(ts);
        self
    }

    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.payload_filters.push(PayloadFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn sort(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Reject out-of-range values instead of clamping them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("user id", &self.user_id)?;
        if let Some(profile_id) = &self.profile_id {
            validate_id("profile id", profile_id)?;
        }

        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(ValidationError::OutOfRange {
                field: "limit",
                value: i64::from(self.limit),
                min: 1,
                max: i64::from(MAX_LIMIT),
            });
        }

        // Tag filters follow the same shape rules as stored tags
        Tags::new(self.tags.iter().cloned())?;

        if let Some(from) = &self.from_timestamp {
            validate_timestamp("from timestamp", from)?;
        }
        if let Some(to) = &self.to_timestamp {
            validate_timestamp("to timestamp", to)?;
        }

        if let (Some(from), Some(to)) = (self.from_timestamp, self.to_timestamp) {
            if from > to {
                return Err(ValidationError::Inconsistent {
                    reason: format!("from timestamp {} is after to timestamp {}", from, to),
                });
            }
        }

        for filter in &self.payload_filters {
            if !FIELD_RE.is_match(&filter.field) {
                return Err(ValidationError::InvalidFormat {
                    field: "payload field",
                    reason: "must be dot-separated identifiers of letters, digits and underscores",
                });
            }
        }

        Ok(())
    }
}
