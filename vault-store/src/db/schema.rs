//! Schema bootstrap
//!
//! Idempotent DDL run on open. There is no migration tooling; tables are
//! created if missing and otherwise left alone.

use rusqlite::Connection;
use tracing::debug;

use crate::error::StoreResult;

/// Table names backing one resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSet {
    /// Canonical records
    pub records: &'static str,
    /// Update request id -> resource id
    pub ledger: &'static str,
    /// Resource id -> tag junction
    pub tags: &'static str,
}

impl TableSet {
    /// DDL for the three tables and their indexes.
    pub fn ddl(&self) -> String {
        let TableSet {
            records,
            ledger,
            tags,
        } = *self;

        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {records} (
                id TEXT PRIMARY KEY,
                create_request_id TEXT NOT NULL UNIQUE,
                user_id TEXT NOT NULL,
                profile_id TEXT,
                natural_key TEXT UNIQUE,
                create_timestamp TEXT NOT NULL,
                update_timestamp TEXT NOT NULL,
                tags TEXT,
                payload TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{records}_user_id ON {records}(user_id);
            CREATE INDEX IF NOT EXISTS idx_{records}_create_timestamp ON {records}(create_timestamp);

            -- No foreign key: ledger rows outlive the resource as an audit trail
            CREATE TABLE IF NOT EXISTS {ledger} (
                request_id TEXT PRIMARY KEY,
                resource_id TEXT NOT NULL,
                update_timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{ledger}_resource_id ON {ledger}(resource_id);

            CREATE TABLE IF NOT EXISTS {tags} (
                resource_id TEXT NOT NULL REFERENCES {records}(id) ON DELETE CASCADE,
                tag TEXT NOT NULL,
                PRIMARY KEY (resource_id, tag)
            );
            CREATE INDEX IF NOT EXISTS idx_{tags}_tag ON {tags}(tag);
            CREATE INDEX IF NOT EXISTS idx_{tags}_resource_id ON {tags}(resource_id);
            "#
        )
    }
}

/// Create every table in `sets` if missing.
pub fn ensure(conn: &Connection, sets: &[TableSet]) -> StoreResult<()> {
    for set in sets {
        conn.execute_batch(&set.ddl())?;
        debug!(table = set.records, "ensured resource tables");
    }
    Ok(())
}
