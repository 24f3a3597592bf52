//! Core database infrastructure
//!
//! This module provides the building blocks of a provisioning run:
//! - `Session`: an open handle with an implicit transaction, plus `SessionGuard`
//! - `Connector` / `acquire`: session acquisition with bounded retry
//! - `PgConnector` / `SqliteConnector`: the PostgreSQL and SQLite backends
//! - `ensure_table`: per-table existence check and creation

mod connector;
mod error;
mod pg;
mod schema;
mod session;
mod sqlite;

pub use connector::{
    acquire, ConnectionFailure, Connector, RetryPolicy, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_DELAY,
};
pub use error::DbError;
pub use pg::{PgConnector, PgSession, TARGET_SCHEMA};
pub use schema::{
    check_table, ensure_table, DuplicateTable, ReconcileError, TableOutcome, TableSet, TableSpec,
};
pub use session::{Session, SessionGuard};
pub use sqlite::{SqliteConnector, SqliteSession};
