//! Idempotent Update
//!
//! The update ledger is consulted before the record itself. A request id
//! that was already applied returns the resource's current state without
//! writing anything, or `NotFoundAfterLedgerHit` if the resource has been
//! deleted since.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::codec::{encode_payload, encode_tags, unique_violation};
use super::{fetch, tags, Lookup, ResourceStore};
use crate::error::{StoreError, StoreResult};
use crate::kinds::ResourceKind;
use crate::models::validation::{validate_id, validate_timestamp};
use crate::models::{Record, RecordPatch};
use crate::time::{format_timestamp, parse_timestamp};

/// One consumed update request id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub request_id: String,
    pub resource_id: String,
    /// When the request was first applied
    pub update_timestamp: DateTime<Utc>,
}

impl<K: ResourceKind> ResourceStore<K> {
    /// Apply `patch` to record `id` under the idempotency token `request_id`.
    ///
    /// Supplied fields replace stored ones wholesale. A replayed token
    /// returns the latest state of the resource it touched, which may
    /// include later updates made under other tokens.
    pub fn update(
        &self,
        request_id: &str,
        id: &str,
        patch: RecordPatch<K::Patch>,
    ) -> StoreResult<Record<K::Body>> {
        validate_id("request id", request_id)?;
        validate_id("id", id)?;
        let requested_at = patch.update_timestamp.unwrap_or_else(|| self.clock.now());
        validate_timestamp("update timestamp", &requested_at)?;

        self.connections.with_transaction(|tx| {
            if let Some(entry) = find_ledger_entry::<K>(tx, request_id)? {
                return replay::<K>(tx, entry, id);
            }

            let mut record =
                fetch::<K>(tx, Lookup::Id, id)?.ok_or_else(|| StoreError::not_found(K::NAME, id))?;

            if let Some(tags) = &patch.tags {
                record.tags = tags.clone();
            }
            K::apply_patch(&mut record.body, patch.fields);
            K::validate(&record.body)?;

            let updated_at = format_timestamp(requested_at.max(record.create_timestamp));
            let payload = encode_payload(&record.body)?;
            let natural_key = K::natural_key(&record.scope(), &record.body);

            let written = tx.execute(
                &format!(
                    "UPDATE {} SET tags = COALESCE(?1, tags), payload = ?2, natural_key = ?3,
                                   update_timestamp = ?4
                     WHERE id = ?5",
                    K::TABLES.records
                ),
                params![encode_tags(patch.tags.as_ref())?, payload, natural_key, updated_at, id],
            );
            if let Err(err) = written {
                let duplicate = unique_violation(&err) == Some("natural_key");
                return Err(if duplicate {
                    StoreError::Duplicate {
                        kind: K::NAME,
                        key: natural_key.unwrap_or_default(),
                    }
                } else {
                    err.into()
                });
            }

            tx.execute(
                &format!(
                    "INSERT INTO {} (request_id, resource_id, update_timestamp) VALUES (?1, ?2, ?3)",
                    K::TABLES.ledger
                ),
                params![request_id, id, updated_at],
            )?;

            if let Some(tags) = &patch.tags {
                tags::sync_tags(tx, K::TABLES.tags, id, tags)?;
            }

            let record = fetch::<K>(tx, Lookup::Id, id)?
                .ok_or_else(|| StoreError::Internal(format!("{} '{}' vanished after update", K::NAME, id)))?;
            info!(kind = K::NAME, id, request_id, "updated");
            Ok(record)
        })
    }
}

fn replay<K: ResourceKind>(
    conn: &Connection,
    entry: LedgerEntry,
    requested_id: &str,
) -> StoreResult<Record<K::Body>> {
    if entry.resource_id != requested_id {
        warn!(
            kind = K::NAME,
            request_id = %entry.request_id,
            ledger_id = %entry.resource_id,
            requested_id,
            "update request id replayed against a different resource"
        );
    }

    match fetch::<K>(conn, Lookup::Id, &entry.resource_id)? {
        Some(record) => {
            debug!(kind = K::NAME, id = %record.id, request_id = %entry.request_id, "update replayed");
            Ok(record)
        }
        None => Err(StoreError::NotFoundAfterLedgerHit {
            kind: K::NAME,
            id: entry.resource_id,
            request_id: entry.request_id,
        }),
    }
}

pub(crate) fn find_ledger_entry<K: ResourceKind>(
    conn: &Connection,
    request_id: &str,
) -> StoreResult<Option<LedgerEntry>> {
    let row = conn
        .prepare_cached(&format!(
            "SELECT request_id, resource_id, update_timestamp FROM {} WHERE request_id = ?1",
            K::TABLES.ledger
        ))?
        .query_row(params![request_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .optional()?;

    row.map(|(request_id, resource_id, ts)| {
        Ok(LedgerEntry {
            update_timestamp: parse_timestamp(K::TABLES.ledger, &ts)?,
            request_id,
            resource_id,
        })
    })
    .transpose()
}
