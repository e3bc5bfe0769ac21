//! Generic resource store
//!
//! `ResourceStore<K>` serves Create, Update, Get, List and Delete for one
//! resource kind. Every logical write runs in a single IMMEDIATE
//! transaction covering the record row, the update ledger and the tag
//! index, so a failure part-way leaves none of them changed.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::db::ConnectionManager;
use crate::error::{StoreError, StoreResult};
use crate::kinds::ResourceKind;
use crate::models::validation::validate_id;
use crate::models::{ListQuery, OwnerScope, Record};
use crate::time::Clock;

pub mod codec;
mod create;
pub(crate) mod query;
mod tags;
mod update;

pub use codec::MAX_PAYLOAD_BYTES;
pub use update::LedgerEntry;

use codec::{RawRow, RECORD_COLUMNS};
use query::QueryBuilder;

/// Column a single record is looked up by
#[derive(Debug, Clone, Copy)]
pub(crate) enum Lookup {
    Id,
    CreateRequest,
    NaturalKey,
}

impl Lookup {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CreateRequest => "create_request_id",
            Self::NaturalKey => "natural_key",
        }
    }
}

pub struct ResourceStore<K> {
    connections: Arc<ConnectionManager>,
    clock: Arc<dyn Clock>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for ResourceStore<K> {
    fn clone(&self) -> Self {
        Self {
            connections: Arc::clone(&self.connections),
            clock: Arc::clone(&self.clock),
            _kind: PhantomData,
        }
    }
}

impl<K: ResourceKind> fmt::Debug for ResourceStore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStore")
            .field("kind", &K::NAME)
            .field("table", &K::TABLES.records)
            .finish()
    }
}

impl<K: ResourceKind> ResourceStore<K> {
    pub(crate) fn new(connections: Arc<ConnectionManager>, clock: Arc<dyn Clock>) -> Self {
        Self {
            connections,
            clock,
            _kind: PhantomData,
        }
    }

    /// Fetch a record by id.
    pub fn get(&self, id: &str) -> StoreResult<Record<K::Body>> {
        validate_id("id", id)?;
        self.connections
            .with_connection(|conn| fetch::<K>(conn, Lookup::Id, id))?
            .ok_or_else(|| StoreError::not_found(K::NAME, id))
    }

    /// Fetch a record only if it falls inside `scope`.
    ///
    /// Records owned by someone else report `NotFound`, the same as records
    /// that do not exist.
    pub fn get_scoped(&self, scope: &OwnerScope, id: &str) -> StoreResult<Record<K::Body>> {
        scope.validate(false)?;
        let record = self.get(id)?;
        if scope.covers(&record.scope()) {
            Ok(record)
        } else {
            debug!(kind = K::NAME, id, user_id = %scope.user_id, "record outside caller scope");
            Err(StoreError::not_found(K::NAME, id))
        }
    }

    /// Fetch a record by its natural key (e.g. normalized email).
    pub fn get_by_natural_key(&self, key: &str) -> StoreResult<Record<K::Body>> {
        self.connections
            .with_connection(|conn| fetch::<K>(conn, Lookup::NaturalKey, key))?
            .ok_or_else(|| StoreError::not_found(K::NAME, key))
    }

    /// One page of records matching `query`.
    pub fn list(&self, query: &ListQuery) -> StoreResult<Vec<Record<K::Body>>> {
        query.validate()?;
        let stmt = QueryBuilder::new(K::TABLES, query).select();
        debug!(kind = K::NAME, sql = %stmt.sql, params = stmt.params.len(), "list");

        let rows = self.connections.with_connection(|conn| {
            let mut prepared = conn.prepare_cached(&stmt.sql)?;
            let rows = prepared
                .query_map(params_from_iter(stmt.params.iter()), RawRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|row| row.decode(K::TABLES.records))
            .collect()
    }

    /// Number of records matching `query`, ignoring limit and offset.
    pub fn count(&self, query: &ListQuery) -> StoreResult<u64> {
        query.validate()?;
        let stmt = QueryBuilder::new(K::TABLES, query).count();
        let total: i64 = self.connections.with_connection(|conn| {
            Ok(conn.query_row(&stmt.sql, params_from_iter(stmt.params.iter()), |row| {
                row.get(0)
            })?)
        })?;
        Ok(total.max(0) as u64)
    }

    /// Hard delete. Tag index rows cascade; update ledger rows are kept.
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        validate_id("id", id)?;
        let deleted = self.connections.with_transaction(|tx| {
            Ok(tx.execute(
                &format!("DELETE FROM {} WHERE id = ?1", K::TABLES.records),
                params![id],
            )?)
        })?;

        if deleted == 0 {
            return Err(StoreError::not_found(K::NAME, id));
        }
        info!(kind = K::NAME, id, "deleted");
        Ok(())
    }

    /// Tags present in the tag index for `id`, sorted.
    pub fn indexed_tags(&self, id: &str) -> StoreResult<Vec<String>> {
        self.connections
            .with_connection(|conn| tags::indexed_tags(conn, K::TABLES.tags, id))
    }

    /// Ledger row for an update request id, if that request was applied.
    pub fn ledger_entry(&self, request_id: &str) -> StoreResult<Option<LedgerEntry>> {
        self.connections
            .with_connection(|conn| update::find_ledger_entry::<K>(conn, request_id))
    }
}

pub(crate) fn fetch<K: ResourceKind>(
    conn: &Connection,
    lookup: Lookup,
    value: &str,
) -> StoreResult<Option<Record<K::Body>>> {
    let sql = format!(
        "SELECT {} FROM {} r WHERE r.{} = ?1",
        RECORD_COLUMNS,
        K::TABLES.records,
        lookup.column()
    );
    let raw = conn
        .prepare_cached(&sql)?
        .query_row(params![value], RawRow::from_row)
        .optional()?;
    raw.map(|row| row.decode(K::TABLES.records)).transpose()
}
