//! Store entry point

use std::sync::Arc;

use tracing::info;

use crate::config::StoreConfig;
use crate::db::{schema, ConnectionManager};
use crate::error::StoreResult;
use crate::kinds::{ApiKeys, DataPackets, Profiles, ResourceKind, Users, ALL_TABLES};
use crate::store::ResourceStore;
use crate::time::{Clock, SystemClock};

/// An open vault database.
///
/// Cheap to clone; clones share the connection manager and clock. There
/// is no process-wide state: two `Vault`s opened on different paths are
/// fully independent.
#[derive(Clone)]
pub struct Vault {
    connections: Arc<ConnectionManager>,
    clock: Arc<dyn Clock>,
}

impl Vault {
    /// Open (or create) the database described by `config`.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    pub fn open_with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let connections = Arc::new(ConnectionManager::new(config)?);
        connections.with_transaction(|tx| schema::ensure(tx, &ALL_TABLES))?;
        info!(
            path = %connections.config().database_path.display(),
            "vault ready"
        );
        Ok(Self { connections, clock })
    }

    pub fn data_packets(&self) -> ResourceStore<DataPackets> {
        self.store()
    }

    pub fn profiles(&self) -> ResourceStore<Profiles> {
        self.store()
    }

    pub fn users(&self) -> ResourceStore<Users> {
        self.store()
    }

    pub fn api_keys(&self) -> ResourceStore<ApiKeys> {
        self.store()
    }

    /// Store for any kind whose tables exist. Kinds defined outside this
    /// crate go through [`Vault::register`] first.
    pub fn store<K: ResourceKind>(&self) -> ResourceStore<K> {
        ResourceStore::new(Arc::clone(&self.connections), Arc::clone(&self.clock))
    }

    /// Create the tables for `K` if missing and return its store.
    pub fn register<K: ResourceKind>(&self) -> StoreResult<ResourceStore<K>> {
        self.connections
            .with_transaction(|tx| schema::ensure(tx, &[K::TABLES]))?;
        Ok(self.store())
    }

    pub fn config(&self) -> &StoreConfig {
        self.connections.config()
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Release the calling thread's connection.
    pub fn close_current_thread(&self) -> bool {
        self.connections.close_current_thread()
    }
}
