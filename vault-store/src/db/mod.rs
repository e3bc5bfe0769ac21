//! Database layer - per-thread connections, transactions, schema
//!
//! # Design Principles
//!
//! - One connection per worker thread, owned by an explicit manager
//! - Every logical write (record + ledger + tag index) is one transaction
//! - Rely on DB constraints, handle conflicts - no check-then-insert

pub mod connection;
pub mod schema;

pub use connection::ConnectionManager;
pub use schema::TableSet;
