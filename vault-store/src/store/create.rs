//! Idempotent Create
//!
//! The insert is `ON CONFLICT(create_request_id) DO NOTHING`, so a reused
//! token affects zero rows instead of failing. Any other uniqueness
//! violation is classified after checking whether the token was already
//! consumed, since a retry can collide on several constraints at once.

use rusqlite::{params, Connection};
use tracing::{debug, info, warn};

use super::codec::{encode_payload, encode_tags, unique_violation};
use super::{fetch, tags, Lookup, ResourceStore};
use crate::error::{StoreError, StoreResult};
use crate::kinds::ResourceKind;
use crate::models::validation::{validate_id, validate_timestamp};
use crate::models::{NewRecord, OwnerScope, Record};
use crate::time::format_timestamp;

impl<K: ResourceKind> ResourceStore<K> {
    /// Create a record under the idempotency token `request_id`.
    ///
    /// Repeating the call with the same token and owning scope returns the
    /// stored record unchanged; the new candidate's fields are discarded.
    /// The same token under a different scope is a `LedgerIntegrity` error.
    /// A fresh token with a taken id is `AlreadyExists`.
    pub fn create(&self, request_id: &str, new: NewRecord<K::Body>) -> StoreResult<Record<K::Body>> {
        validate_id("request id", request_id)?;
        validate_id("id", &new.id)?;
        new.scope.validate(K::REQUIRES_PROFILE)?;
        K::check_scope(&new.id, &new.scope)?;
        K::validate(&new.body)?;

        let created_at = new.create_timestamp.unwrap_or_else(|| self.clock.now());
        validate_timestamp("create timestamp", &created_at)?;
        let created_at = format_timestamp(created_at);
        let payload = encode_payload(&new.body)?;
        let tags_json = encode_tags(new.tags.as_ref())?;
        let natural_key = K::natural_key(&new.scope, &new.body);

        self.connections.with_transaction(|tx| {
            let inserted = tx.execute(
                &format!(
                    "INSERT INTO {} (id, create_request_id, user_id, profile_id, natural_key,
                                     create_timestamp, update_timestamp, tags, payload)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7, ?8)
                     ON CONFLICT(create_request_id) DO NOTHING",
                    K::TABLES.records
                ),
                params![
                    new.id,
                    request_id,
                    new.scope.user_id,
                    new.scope.profile_id,
                    natural_key,
                    created_at,
                    tags_json,
                    payload,
                ],
            );

            match inserted {
                Ok(0) => replay::<K>(tx, request_id, &new.scope),
                Ok(_) => {
                    if let Some(tags) = &new.tags {
                        tags::sync_tags(tx, K::TABLES.tags, &new.id, tags)?;
                    }
                    let record = fetch::<K>(tx, Lookup::Id, &new.id)?.ok_or_else(|| {
                        StoreError::Internal(format!("{} '{}' vanished after insert", K::NAME, new.id))
                    })?;
                    info!(kind = K::NAME, id = %record.id, request_id, "created");
                    Ok(record)
                }
                Err(err) => {
                    let Some(column) = unique_violation(&err).map(str::to_owned) else {
                        return Err(err.into());
                    };
                    if fetch::<K>(tx, Lookup::CreateRequest, request_id)?.is_some() {
                        return replay::<K>(tx, request_id, &new.scope);
                    }
                    match column.as_str() {
                        "id" => Err(StoreError::already_exists(K::NAME, new.id.as_str())),
                        "natural_key" => Err(StoreError::Duplicate {
                            kind: K::NAME,
                            key: natural_key.clone().unwrap_or_default(),
                        }),
                        _ => Err(err.into()),
                    }
                }
            }
        })
    }
}

/// Resolve a reused create token against the record it produced.
fn replay<K: ResourceKind>(
    conn: &Connection,
    request_id: &str,
    scope: &OwnerScope,
) -> StoreResult<Record<K::Body>> {
    let existing = fetch::<K>(conn, Lookup::CreateRequest, request_id)?.ok_or_else(|| {
        StoreError::Internal(format!(
            "{} create request '{}' conflicted but no row holds it",
            K::NAME,
            request_id
        ))
    })?;

    let stored = existing.scope();
    if &stored != scope {
        warn!(
            kind = K::NAME,
            request_id,
            stored_user = %stored.user_id,
            caller_user = %scope.user_id,
            "create request id reused across owners"
        );
        return Err(StoreError::ledger_integrity(
            K::NAME,
            request_id,
            "request id already used by a different owner",
        ));
    }

    debug!(kind = K::NAME, id = %existing.id, request_id, "create replayed");
    Ok(existing)
}
