//! vault-store - embedded idempotent resource store
//!
//! SQLite-backed storage for user-owned resources with:
//! - Create and Update keyed by caller idempotency tokens
//! - An update ledger that survives deletes as an audit trail
//! - A tag index rebuilt in the same transaction as every tagged write
//! - Scoped, paginated listing through a parameterized query builder
//!
//! # Example
//! ```
//! use vault_store::kinds::DataPacketBody;
//! use vault_store::models::{ListQuery, NewRecord, OwnerScope, Tags};
//! use vault_store::{StoreConfig, Vault};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let vault = Vault::open(StoreConfig::at(dir.path().join("vault.db"))).unwrap();
//! let packets = vault.data_packets();
//!
//! let new = NewRecord::new("p1", OwnerScope::profile("u1", "default"), DataPacketBody::default())
//!     .with_tags(Tags::new(["work", "urgent"]).unwrap());
//! let first = packets.create("r1", new.clone()).unwrap();
//!
//! // Retrying with the same token returns the original, ignoring new fields
//! let retry = packets
//!     .create("r1", new.with_tags(Tags::new(["home"]).unwrap()))
//!     .unwrap();
//! assert_eq!(retry, first);
//!
//! let page = packets.list(&ListQuery::for_user("u1").tag("work")).unwrap();
//! assert_eq!(page.len(), 1);
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod kinds;
pub mod models;
pub mod store;
pub mod time;
pub mod vault;

pub use config::{JournalMode, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use kinds::ResourceKind;
pub use models::{ListQuery, NewRecord, OwnerScope, Record, RecordPatch, SortOrder, Tags};
pub use store::{LedgerEntry, ResourceStore};
pub use time::{Clock, FixedClock, SystemClock};
pub use vault::Vault;
