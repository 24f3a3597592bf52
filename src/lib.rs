#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! pgsetup - idempotent database schema bootstrapper
//!
//! pgsetup connects to a database server with bounded retry and then makes
//! sure a fixed set of tables exists, creating only the ones that are
//! missing. Running it again against a provisioned database executes no DDL.
//! It can be used as both a command-line application and a library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (always) | Connectors, reconciliation, configuration | `postgres`, `rusqlite`, `config` |
//! | `cli` | `pgsetup` binary | `clap`, `tabled`, `tracing-subscriber` |
//!
//! ```toml
//! # Library only
//! pgsetup = { version = "0.3", default-features = false }
//! ```
//!
//! # Architecture
//!
//! - **[`database`]**: sessions, connectors, per-table reconciliation, table definitions
//! - **[`provision`]**: the end-to-end run (acquire, reconcile, commit, release)
//! - **[`observer`]**: progress and diagnostic events, logged through `tracing` by default
//! - **[`config`]**: connection settings from `.env`, a TOML file and the environment
//! - **[`output`]**: output format selection for the CLI
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pgsetup::{provision, ConnectionConfig, PgConnector, TableDefinitions, TracingObserver};
//!
//! let config = ConnectionConfig::load(&None)?;
//! let connector = PgConnector::new(config.clone());
//! let report = provision(
//!     &connector,
//!     &config.retry_policy(),
//!     &TableDefinitions::table_set(),
//!     &TracingObserver,
//! )?;
//! println!("created {} table(s)", report.created());
//! ```

pub mod config;
pub mod database;
pub mod observer;
pub mod output;
pub mod provision;

pub use crate::config::{ConnectionConfig, ConnectionInfo};

pub use database::{
    acquire, check_table, ensure_table, load_manifest, ConnectionFailure, Connector, DbError,
    DuplicateTable, PgConnector, ReconcileError, RetryPolicy, Session, SessionGuard,
    SqliteConnector, TableDefinitions, TableOutcome, TableSet, TableSpec,
};

pub use observer::{NoopObserver, ProvisionObserver, TracingObserver};

pub use output::OutputFormat;

pub use provision::{
    provision, status, ProvisionError, ProvisionReport, TableAction, TableReport, TableStatus,
};
