//! Tag index maintenance
//!
//! The index is derived from the row's tag list and always rebuilt whole:
//! delete every row for the resource, then insert the new set. Callers run
//! this inside the same transaction as the record write.

use rusqlite::{params, Connection};

use crate::error::StoreResult;
use crate::models::Tags;

pub(crate) fn sync_tags(conn: &Connection, table: &str, id: &str, tags: &Tags) -> StoreResult<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE resource_id = ?1", table),
        params![id],
    )?;

    let mut insert =
        conn.prepare_cached(&format!("INSERT INTO {} (resource_id, tag) VALUES (?1, ?2)", table))?;
    for tag in tags.iter() {
        insert.execute(params![id, tag])?;
    }
    Ok(())
}

/// Tags currently indexed for `id`, sorted.
pub(crate) fn indexed_tags(conn: &Connection, table: &str, id: &str) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT tag FROM {} WHERE resource_id = ?1 ORDER BY tag",
        table
    ))?;
    let tags = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(tags)
}
