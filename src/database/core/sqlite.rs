//! SQLite session backend
//!
//! Used for local schema files and for offline checks of a table set. The
//! catalog lookup goes through `sqlite_master` of the main database.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

use super::{Connector, DbError, Session};

/// Opens SQLite sessions on a file, or in memory when no path is given
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: Option<PathBuf>,
    busy_timeout: Duration,
}

impl SqliteConnector {
    pub fn new(path: Option<&Path>, busy_timeout: Duration) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            busy_timeout,
        }
    }

    /// Connector for a database file
    pub fn open_path(path: impl AsRef<Path>) -> Self {
        Self::new(Some(path.as_ref()), Duration::from_secs(10))
    }

    /// Connector for a fresh in-memory database per session
    pub fn in_memory() -> Self {
        Self::new(None, Duration::from_secs(10))
    }
}

impl Connector for SqliteConnector {
    type Session = SqliteSession;

    fn target(&self) -> String {
        match &self.path {
            Some(p) => format!("sqlite://{}", p.display()),
            None => "sqlite::memory:".to_string(),
        }
    }

    fn connect(&self) -> Result<SqliteSession, DbError> {
        let conn = match &self.path {
            Some(p) => Connection::open(p)?,
            None => Connection::open_in_memory()?,
        };
        SqliteSession::begin(conn, self.busy_timeout)
    }
}

/// One SQLite connection with an open transaction
#[derive(Debug)]
pub struct SqliteSession {
    conn: Connection,
}

impl SqliteSession {
    fn begin(conn: Connection, busy_timeout: Duration) -> Result<Self, DbError> {
        conn.busy_timeout(busy_timeout)?;

        // WAL lets readers keep going while DDL is applied; in-memory
        // databases answer "memory" and keep their journal
        let _: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute("PRAGMA foreign_keys=ON", [])?;

        conn.execute_batch("BEGIN")?;
        Ok(Self { conn })
    }
}

impl Session for SqliteSession {
    fn table_exists(&mut self, name: &str) -> Result<bool, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DbError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn close(self) -> Result<(), DbError> {
        self.conn.close().map_err(|(_, e)| DbError::from(e))
    }
}
