//! Per-thread connections and scoped transactions
//!
//! Each worker thread lazily gets exactly one SQLite connection, owned by
//! the manager instance rather than a process-wide thread-local. SQLite
//! serializes writers at the file level; a second writer blocks for up to
//! `busy_timeout_ms` waiting for the first to commit or roll back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, ThreadId};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

type SharedConnection = Arc<Mutex<Connection>>;

/// Owns one connection per thread that has touched the store.
pub struct ConnectionManager {
    config: StoreConfig,
    connections: Mutex<HashMap<ThreadId, SharedConnection>>,
}

impl ConnectionManager {
    /// Create the manager, making sure the database file can be opened and
    /// setting the journal mode once.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = Self {
            config,
            connections: Mutex::new(HashMap::new()),
        };

        manager.with_connection(|conn| {
            let mode: String = conn.pragma_update_and_check(
                None,
                "journal_mode",
                manager.config.journal_mode.as_pragma(),
                |row| row.get(0),
            )?;
            debug!(
                path = %manager.config.database_path.display(),
                journal_mode = %mode,
                "opened vault database"
            );
            Ok(())
        })?;

        Ok(manager)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn open_connection(&self) -> StoreResult<Connection> {
        let conn = Connection::open(&self.config.database_path)?;
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<ThreadId, SharedConnection>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The calling thread's connection, opened on first use.
    fn current(&self) -> StoreResult<SharedConnection> {
        let id = thread::current().id();
        if let Some(conn) = self.registry().get(&id) {
            return Ok(Arc::clone(conn));
        }

        // Open outside the registry lock so other threads are not held up
        let conn = Arc::new(Mutex::new(self.open_connection()?));
        let mut registry = self.registry();
        let conn = Arc::clone(registry.entry(id).or_insert(conn));
        debug!(thread = ?id, open = registry.len(), "opened thread connection");
        Ok(conn)
    }

    fn lock<'a>(&self, shared: &'a SharedConnection) -> StoreResult<MutexGuard<'a, Connection>> {
        // Only the owning thread ever locks its connection, so contention
        // means a nested call from inside a transaction scope.
        match shared.try_lock() {
            Ok(guard) => Ok(guard),
            // A panicking scope already rolled back when its Transaction dropped
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => Err(StoreError::Internal(
                "re-entrant use of the thread connection inside a transaction scope".into(),
            )),
        }
    }

    /// Run `f` on this thread's connection without opening a transaction.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let shared = self.current()?;
        let conn = self.lock(&shared)?;
        f(&conn)
    }

    /// Run `f` inside one write transaction: commit if it returns `Ok`,
    /// roll back and hand the error back if it returns `Err`.
    ///
    /// The transaction is IMMEDIATE, so the write lock is taken up front and
    /// reads inside the scope cannot be invalidated by another writer.
    pub fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let shared = self.current()?;
        let mut conn = self.lock(&shared)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                debug!(error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }

    /// Close the calling thread's connection. Returns false if it had none.
    ///
    /// Long-lived processes call this at the end of a unit of work to bound
    /// the number of open connections.
    pub fn close_current_thread(&self) -> bool {
        let id = thread::current().id();
        let removed = self.registry().remove(&id);
        match removed {
            Some(shared) => {
                match Arc::try_unwrap(shared) {
                    Ok(mutex) => {
                        let conn = mutex.into_inner().unwrap_or_else(PoisonError::into_inner);
                        if let Err((_, e)) = conn.close() {
                            warn!(error = %e, "failed to close connection cleanly");
                        }
                    }
                    // Still borrowed by a scope on this thread; dropped when it ends
                    Err(_) => debug!(thread = ?id, "connection still in use, deferring close"),
                }
                true
            }
            None => false,
        }
    }

    /// Number of threads currently holding a connection.
    pub fn open_connections(&self) -> usize {
        self.registry().len()
    }
}
