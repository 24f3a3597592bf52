//! Database module
//!
//! This module provides everything a provisioning run touches on the database
//! side, organized into:
//!
//! - **core**: sessions, connectors with retry, per-table reconciliation
//! - **tables**: the built-in table definitions and the manifest loader
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── session     # Session trait and SessionGuard (scoped release)
//! │   ├── connector   # Connector trait, RetryPolicy, acquire()
//! │   ├── pg          # PostgreSQL backend
//! │   ├── sqlite      # SQLite backend
//! │   └── schema      # TableSpec, TableSet, ensure_table()
//! │
//! └── tables          # Built-in DDL and TOML manifests
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use pgsetup::database::{acquire, ensure_table, SqliteConnector, RetryPolicy, TableDefinitions};
//! use pgsetup::observer::TracingObserver;
//!
//! let connector = SqliteConnector::open_path("schema.sqlite3");
//! let mut session = acquire(&connector, &RetryPolicy::default(), &TracingObserver)?;
//! for spec in &TableDefinitions::table_set() {
//!     ensure_table(&mut session, spec, &TracingObserver)?;
//! }
//! ```

pub mod core;
pub mod tables;

#[cfg(test)]
pub(crate) mod testing;

pub use self::core::{
    acquire, check_table, ensure_table, ConnectionFailure, Connector, DbError, DuplicateTable,
    PgConnector, PgSession, ReconcileError, RetryPolicy, Session, SessionGuard, SqliteConnector,
    SqliteSession, TableOutcome, TableSet, TableSpec, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY,
    TARGET_SCHEMA,
};
pub use tables::{load_manifest, TableDefinitions};
