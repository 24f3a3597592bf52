//! Table specifications and per-table reconciliation
//!
//! [`ensure_table`] compares one [`TableSpec`] against the database catalog
//! and runs its creation statement when the table is missing. Each table is
//! handled inside its own savepoint, so a failed statement is rolled back
//! without aborting the enclosing transaction and the next table starts from
//! a clean state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{DbError, Session};
use crate::observer::ProvisionObserver;

const TABLE_SAVEPOINT: &str = "pgsetup_table";

/// A table name paired with the DDL statement that creates it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    name: String,
    create_sql: String,
}

impl TableSpec {
    pub fn new(name: impl Into<String>, create_sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            create_sql: create_sql.into(),
        }
    }

    /// Identifier matched exactly against the catalog
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create_sql(&self) -> &str {
        &self.create_sql
    }
}

/// The same table name was declared twice
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("table {0} is declared more than once")]
pub struct DuplicateTable(pub String);

/// Ordered set of table specs with unique names
///
/// Iteration follows declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSet {
    specs: Vec<TableSpec>,
}

impl TableSet {
    pub fn new(specs: Vec<TableSpec>) -> Result<Self, DuplicateTable> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.name()) {
                return Err(DuplicateTable(spec.name().to_string()));
            }
        }
        Ok(Self { specs })
    }

    /// Build from a list already known to have unique names
    pub(crate) fn from_unique(specs: Vec<TableSpec>) -> Self {
        debug_assert!(Self::new(specs.clone()).is_ok());
        Self { specs }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(TableSpec::name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&TableSpec> {
        self.specs.iter().find(|s| s.name() == name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<'a> IntoIterator for &'a TableSet {
    type Item = &'a TableSpec;
    type IntoIter = std::slice::Iter<'a, TableSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

/// What [`ensure_table`] did for a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOutcome {
    /// The table was missing and its creation statement ran
    Created,
    /// The table was already present; nothing was executed
    AlreadyExists,
}

/// Failure to reconcile a single table
///
/// Recovered by the caller: the run goes on with the remaining tables.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("error while checking table {table}: {source}")]
    Check {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("error while creating table {table}: {source}")]
    Create {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("error while isolating table {table}: {source}")]
    Savepoint {
        table: String,
        #[source]
        source: DbError,
    },
}

impl ReconcileError {
    pub fn table(&self) -> &str {
        match self {
            Self::Check { table, .. } | Self::Create { table, .. } | Self::Savepoint { table, .. } => {
                table
            }
        }
    }
}

/// Make sure the table described by `spec` exists, creating it if absent
///
/// The existence check is an exact, case-sensitive lookup of the name in the
/// catalog. The creation statement is executed verbatim.
pub fn ensure_table<S: Session>(
    session: &mut S,
    spec: &TableSpec,
    observer: &dyn ProvisionObserver,
) -> Result<TableOutcome, ReconcileError> {
    let table = spec.name();
    let result = isolated(session, table, |session| {
        observer.checking_table(table);
        if lookup(session, table)? {
            observer.table_exists(table);
            return Ok(TableOutcome::AlreadyExists);
        }

        observer.creating_table(table);
        session
            .execute(spec.create_sql())
            .map_err(|source| ReconcileError::Create {
                table: table.to_string(),
                source,
            })?;
        observer.table_created(table);
        Ok(TableOutcome::Created)
    });

    if let Err(e) = &result {
        observer.table_failed(e);
    }
    result
}

/// Existence check only, with the same isolation as [`ensure_table`]
pub fn check_table<S: Session>(
    session: &mut S,
    table: &str,
    observer: &dyn ProvisionObserver,
) -> Result<bool, ReconcileError> {
    let result = isolated(session, table, |session| {
        observer.checking_table(table);
        let exists = lookup(session, table)?;
        if exists {
            observer.table_exists(table);
        } else {
            observer.table_missing(table);
        }
        Ok(exists)
    });

    if let Err(e) = &result {
        observer.table_failed(e);
    }
    result
}

fn lookup<S: Session>(session: &mut S, table: &str) -> Result<bool, ReconcileError> {
    session
        .table_exists(table)
        .map_err(|source| ReconcileError::Check {
            table: table.to_string(),
            source,
        })
}

/// Run `op` between a savepoint and its release
///
/// Nothing `op` did survives an error: a failed `op` or a failed release
/// both roll back to the savepoint.
fn isolated<S, T, F>(session: &mut S, table: &str, op: F) -> Result<T, ReconcileError>
where
    S: Session,
    F: FnOnce(&mut S) -> Result<T, ReconcileError>,
{
    let savepoint_error = |source: DbError| ReconcileError::Savepoint {
        table: table.to_string(),
        source,
    };

    session.savepoint(TABLE_SAVEPOINT).map_err(savepoint_error)?;

    let result = op(session).and_then(|value| {
        session
            .release_savepoint(TABLE_SAVEPOINT)
            .map_err(savepoint_error)?;
        Ok(value)
    });

    if result.is_err() {
        let restored = session
            .rollback_to_savepoint(TABLE_SAVEPOINT)
            .and_then(|()| session.release_savepoint(TABLE_SAVEPOINT));
        if let Err(rollback) = restored {
            // the table error is reported, not the rollback error
            debug!("could not roll back table {}: {}", table, rollback);
        }
    }
    result
}
