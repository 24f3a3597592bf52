pub mod config;
pub mod run;
pub mod status;
pub mod tables;

use std::path::Path;

use pgsetup::{
    provision, status, ConnectionConfig, Connector, PgConnector, ProvisionError, ProvisionObserver,
    ProvisionReport, RetryPolicy, SqliteConnector, TableSet, TableStatus,
};

/// The database a command talks to
pub enum Backend {
    Postgres(PgConnector),
    Sqlite(SqliteConnector),
}

impl Backend {
    /// PostgreSQL from `config`, unless a SQLite file was requested
    pub fn new(config: &ConnectionConfig, sqlite: Option<&Path>) -> Self {
        match sqlite {
            Some(path) => Backend::Sqlite(SqliteConnector::new(Some(path), config.connect_timeout)),
            None => Backend::Postgres(PgConnector::new(config.clone())),
        }
    }

    pub fn target(&self) -> String {
        match self {
            Backend::Postgres(c) => c.target(),
            Backend::Sqlite(c) => c.target(),
        }
    }

    pub fn provision(
        &self,
        policy: &RetryPolicy,
        tables: &TableSet,
        observer: &dyn ProvisionObserver,
    ) -> Result<ProvisionReport, ProvisionError> {
        match self {
            Backend::Postgres(c) => provision(c, policy, tables, observer),
            Backend::Sqlite(c) => provision(c, policy, tables, observer),
        }
    }

    pub fn status(
        &self,
        policy: &RetryPolicy,
        tables: &TableSet,
        observer: &dyn ProvisionObserver,
    ) -> Result<Vec<TableStatus>, ProvisionError> {
        match self {
            Backend::Postgres(c) => status(c, policy, tables, observer),
            Backend::Sqlite(c) => status(c, policy, tables, observer),
        }
    }
}

/// Print a serializable value in the JSON flavor of `format`
pub(crate) fn print_json<T: serde::Serialize>(format: pgsetup::OutputFormat, value: &T) {
    match format.to_json(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}
