//! Error types for vault-store
//!
//! Uses `thiserror` so the service layer can match on the failure kind and
//! map it to whatever transport representation it uses. The engine never
//! retries internally; everything here propagates verbatim.

use std::io;

use thiserror::Error;

use crate::models::ValidationError;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Main error type for vault-store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record with this id
    #[error("{kind} with ID '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// An update request id was seen before, but the resource it touched is gone
    #[error("{kind} with ID '{id}' no longer exists (update request '{request_id}' was already applied)")]
    NotFoundAfterLedgerHit {
        kind: &'static str,
        id: String,
        request_id: String,
    },

    /// Create with a fresh request id but an id that is already taken
    #[error("{kind} with ID '{id}' already exists")]
    AlreadyExists { kind: &'static str, id: String },

    /// Natural key uniqueness conflict (e.g. one API key per provider and user)
    #[error("{kind} with key '{key}' already exists")]
    Duplicate { kind: &'static str, key: String },

    /// Request id reused across a different owning scope
    #[error("ledger integrity violation for {kind} request '{request_id}': {reason}")]
    LedgerIntegrity {
        kind: &'static str,
        request_id: String,
        reason: String,
    },

    /// Input rejected before reaching storage
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Underlying SQLite failure
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// A stored row could not be decoded
    #[error("corrupt row in {context}: {reason}")]
    Corrupt { context: String, reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            id: id.into(),
        }
    }

    pub fn ledger_integrity(
        kind: &'static str,
        request_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::LedgerIntegrity {
            kind,
            request_id: request_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a corrupt-row error
    pub fn corrupt(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// True for both "never existed" and "existed once, deleted since".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::NotFoundAfterLedgerHit { .. }
        )
    }
}
