#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;
use vault_store::kinds::{DataPacketBody, DataPackets};
use vault_store::models::{NewRecord, OwnerScope, Tags};
use vault_store::{FixedClock, ResourceKind, StoreConfig, Vault};

pub struct TestVault {
    pub vault: Vault,
    pub clock: Arc<FixedClock>,
    // Held so the database file outlives the test
    _dir: TempDir,
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn open() -> TestVault {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("vault_store=debug")
        .with_test_writer()
        .try_init();

    let dir = TempDir::new().unwrap();
    let clock = Arc::new(FixedClock::new(epoch()));
    let vault = Vault::open_with_clock(StoreConfig::at(dir.path().join("vault.db")), clock.clone())
        .unwrap();
    TestVault {
        vault,
        clock,
        _dir: dir,
    }
}

pub fn data(value: Value) -> DataPacketBody {
    DataPacketBody::new(value.as_object().cloned().expect("object"))
}

pub fn packet(id: &str, user: &str, tags: &[&str]) -> NewRecord<DataPacketBody> {
    NewRecord::new(id, OwnerScope::profile(user, "default"), data(json!({ "id": id })))
        .with_tags(Tags::new(tags.iter().copied()).unwrap())
}

/// Number of rows in the kind's record table with `id`
pub fn row_count<K: ResourceKind>(vault: &Vault, id: &str) -> i64 {
    vault
        .connections()
        .with_connection(|c| {
            Ok(c.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE id = ?1", K::TABLES.records),
                [id],
                |r| r.get(0),
            )?)
        })
        .unwrap()
}

pub fn packet_rows(vault: &Vault) -> i64 {
    vault
        .connections()
        .with_connection(|c| {
            Ok(c.query_row(
                &format!("SELECT COUNT(*) FROM {}", DataPackets::TABLES.records),
                [],
                |r| r.get(0),
            )?)
        })
        .unwrap()
}

/// Stored tag list sorted, for comparison with the tag index
pub fn sorted(tags: &Tags) -> Vec<String> {
    let mut v = tags.as_slice().to_vec();
    v.sort();
    v
}
