//! Row encoding and decoding

use rusqlite::ErrorCode;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::models::{Record, Tags, ValidationError};
use crate::time::parse_timestamp;

/// Upper bound on the serialized `payload` column
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Column list matching [`RawRow::from_row`], qualified with the `r` alias
pub(crate) const RECORD_COLUMNS: &str =
    "r.id, r.user_id, r.profile_id, r.create_timestamp, r.update_timestamp, r.tags, r.payload";

/// Undecoded record row, straight from SQLite
#[derive(Debug)]
pub(crate) struct RawRow {
    id: String,
    user_id: String,
    profile_id: Option<String>,
    create_timestamp: String,
    update_timestamp: String,
    tags: Option<String>,
    payload: String,
}

impl RawRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            profile_id: row.get(2)?,
            create_timestamp: row.get(3)?,
            update_timestamp: row.get(4)?,
            tags: row.get(5)?,
            payload: row.get(6)?,
        })
    }

    pub(crate) fn decode<B: DeserializeOwned>(self, table: &str) -> StoreResult<Record<B>> {
        let context = format!("{} '{}'", table, self.id);

        let tags = match self.tags {
            Some(json) => {
                let raw: Vec<String> = serde_json::from_str(&json)
                    .map_err(|e| StoreError::corrupt(&context, format!("tags: {}", e)))?;
                Tags::try_from(raw).map_err(|e| StoreError::corrupt(&context, e.to_string()))?
            }
            None => Tags::empty(),
        };

        let body = serde_json::from_str(&self.payload)
            .map_err(|e| StoreError::corrupt(&context, format!("payload: {}", e)))?;

        Ok(Record {
            create_timestamp: parse_timestamp(&context, &self.create_timestamp)?,
            update_timestamp: parse_timestamp(&context, &self.update_timestamp)?,
            id: self.id,
            user_id: self.user_id,
            profile_id: self.profile_id,
            tags,
            body,
        })
    }
}

pub(crate) fn encode_payload<B: Serialize>(body: &B) -> StoreResult<String> {
    let payload = serde_json::to_string(body)?;
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            field: "payload",
            size: payload.len(),
            max: MAX_PAYLOAD_BYTES,
        }
        .into());
    }
    Ok(payload)
}

/// `None` stays NULL so an omitted tag list is distinguishable from `[]`.
pub(crate) fn encode_tags(tags: Option<&Tags>) -> StoreResult<Option<String>> {
    Ok(match tags {
        Some(tags) => Some(serde_json::to_string(tags)?),
        None => None,
    })
}

/// Column named by a UNIQUE / PRIMARY KEY violation, e.g. `id` for
/// "UNIQUE constraint failed: data_packets.id".
pub(crate) fn unique_violation(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) if e.code == ErrorCode::ConstraintViolation => {
            let columns = msg.strip_prefix("UNIQUE constraint failed: ")?;
            let first = columns.split(", ").next()?;
            first.rsplit('.').next()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Body {
        name: String,
    }

    fn raw(tags: Option<&str>, payload: &str) -> RawRow {
        RawRow {
            id: "x1".into(),
            user_id: "u1".into(),
            profile_id: None,
            create_timestamp: "2024-01-01T00:00:00.000000Z".into(),
            update_timestamp: "2024-01-02T00:00:00.000000Z".into(),
            tags: tags.map(str::to_owned),
            payload: payload.into(),
        }
    }

    #[test]
    fn decodes_row() {
        let record: Record<Body> = raw(Some(r#"["a","b"]"#), r#"{"name":"n"}"#)
            .decode("things")
            .unwrap();
        assert_eq!(record.tags.as_slice(), ["a", "b"]);
        assert_eq!(record.body, Body { name: "n".into() });
        assert!(record.update_timestamp > record.create_timestamp);
    }

    #[test]
    fn null_tags_decode_empty() {
        let record: Record<Body> = raw(None, r#"{"name":"n"}"#).decode("things").unwrap();
        assert!(record.tags.is_empty());
    }

    #[test]
    fn bad_payload_is_corrupt() {
        let err = raw(None, "{not json").decode::<Body>("things").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(err.to_string().contains("things 'x1'"));
    }

    #[test]
    fn oversized_payload_rejected() {
        let big = json!({ "blob": "x".repeat(MAX_PAYLOAD_BYTES) });
        let err = encode_payload(&big).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::TooLarge { field: "payload", .. })
        ));
    }

    #[test]
    fn classifies_unique_violations() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY, token TEXT UNIQUE);")
            .unwrap();
        conn.execute("INSERT INTO t VALUES ('a', 'r1')", []).unwrap();

        let err = conn.execute("INSERT INTO t VALUES ('a', 'r2')", []).unwrap_err();
        assert_eq!(unique_violation(&err), Some("id"));

        let err = conn.execute("INSERT INTO t VALUES ('b', 'r1')", []).unwrap_err();
        assert_eq!(unique_violation(&err), Some("token"));

        let err = conn.execute("INSERT INTO missing VALUES (1)", []).unwrap_err();
        assert_eq!(unique_violation(&err), None);
    }
}
