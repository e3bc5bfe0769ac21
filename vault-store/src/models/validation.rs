//! Validation error types

use std::fmt;

use chrono::{DateTime, Datelike, Utc};

/// Validation error for caller-supplied shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Collection has more entries than allowed
    TooMany { field: &'static str, max: usize },

    /// Serialized value exceeds the byte budget
    TooLarge {
        field: &'static str,
        size: usize,
        max: usize,
    },

    /// String doesn't match required format
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// Numeric value outside the accepted range
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Two fields contradict each other
    Inconsistent { reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::TooMany { field, max } => {
                write!(f, "{} exceeds maximum of {} entries", field, max)
            }
            Self::TooLarge { field, size, max } => {
                write!(f, "{} too large ({} bytes, max {})", field, size, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{} must be between {} and {} (got {})", field, min, max, value),
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::Inconsistent { reason } => f.write_str(reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum length for ids and request ids
pub const MAX_ID_LEN: usize = 100;

/// Check an id-like field: non-blank, bounded length.
pub fn validate_id(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_ID_LEN,
        });
    }
    Ok(())
}

/// Years that encode as fixed-width RFC 3339
const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

/// Check a timestamp stays within four-digit years.
pub fn validate_timestamp(field: &'static str, ts: &DateTime<Utc>) -> Result<(), ValidationError> {
    let year = ts.year();
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValidationError::OutOfRange {
            field,
            value: i64::from(year),
            min: i64::from(MIN_YEAR),
            max: i64::from(MAX_YEAR),
        });
    }
    Ok(())
}
