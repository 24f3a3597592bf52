//! Backend error type shared by every session implementation

use thiserror::Error;

/// Error raised by a database backend while connecting or executing
#[derive(Debug, Error)]
pub enum DbError {
    /// PostgreSQL client error (transport, authentication, SQL)
    #[error("postgres: {0}")]
    Postgres(#[from] postgres::Error),

    /// SQLite error
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A connection setting required to reach the server is not configured
    #[error("missing connection setting: {0}")]
    MissingSetting(&'static str),
}

impl DbError {
    /// Whether another connection attempt could succeed
    ///
    /// Server and transport errors may clear up while the database finishes
    /// starting. A missing setting will not.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::MissingSetting(_))
    }
}
