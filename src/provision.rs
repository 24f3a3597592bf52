//! End-to-end provisioning run
//!
//! [`provision`] acquires one session, reconciles every table in declaration
//! order, commits, and releases the session on every exit path. A failure on
//! one table is recorded in the report and the run moves on; only a failed
//! connection or a failed commit ends the run with an error.
//!
//! [`status`] is the read-only counterpart: existence checks only, no DDL and
//! no commit.

use serde::Serialize;
use thiserror::Error;

use crate::database::{
    acquire, check_table, ensure_table, ConnectionFailure, Connector, DbError, RetryPolicy,
    Session, SessionGuard, TableOutcome, TableSet,
};
use crate::observer::ProvisionObserver;

/// Run-level failure
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// No session could be opened; no table was touched
    #[error(transparent)]
    Connection(#[from] ConnectionFailure),

    /// The transaction could not be committed
    #[error("failed to commit schema changes: {source}")]
    Commit {
        #[source]
        source: DbError,
    },
}

/// What happened to one table during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableAction {
    Created,
    Exists,
    Failed,
}

impl std::fmt::Display for TableAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableAction::Created => write!(f, "created"),
            TableAction::Exists => write!(f, "exists"),
            TableAction::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub name: String,
    pub action: TableAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-table results of a committed run, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub target: String,
    pub tables: Vec<TableReport>,
}

impl ProvisionReport {
    fn new(target: String) -> Self {
        Self {
            target,
            tables: Vec::new(),
        }
    }

    pub fn created(&self) -> usize {
        self.count(TableAction::Created)
    }

    pub fn skipped(&self) -> usize {
        self.count(TableAction::Exists)
    }

    pub fn failed(&self) -> usize {
        self.count(TableAction::Failed)
    }

    /// Whether every table is now present
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, action: TableAction) -> usize {
        self.tables.iter().filter(|t| t.action == action).count()
    }
}

/// Presence of one table as seen by [`status`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub name: String,
    /// `None` when the existence check itself failed
    pub exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reconcile every table in `tables` in a single committed transaction
pub fn provision<C: Connector>(
    connector: &C,
    policy: &RetryPolicy,
    tables: &TableSet,
    observer: &dyn ProvisionObserver,
) -> Result<ProvisionReport, ProvisionError> {
    let session = acquire(connector, policy, observer)?;
    let mut session = SessionGuard::new(session, observer);
    let mut report = ProvisionReport::new(connector.target());

    for spec in tables {
        let entry = match ensure_table(&mut *session, spec, observer) {
            Ok(TableOutcome::Created) => TableReport {
                name: spec.name().to_string(),
                action: TableAction::Created,
                error: None,
            },
            Ok(TableOutcome::AlreadyExists) => TableReport {
                name: spec.name().to_string(),
                action: TableAction::Exists,
                error: None,
            },
            Err(e) => TableReport {
                name: spec.name().to_string(),
                action: TableAction::Failed,
                error: Some(e.to_string()),
            },
        };
        report.tables.push(entry);
    }

    observer.committing();
    if let Err(source) = session.commit() {
        let err = ProvisionError::Commit { source };
        observer.run_failed(&err);
        return Err(err);
    }
    observer.committed(&report);

    session.release();
    Ok(report)
}

/// Report which tables of `tables` exist, without changing anything
pub fn status<C: Connector>(
    connector: &C,
    policy: &RetryPolicy,
    tables: &TableSet,
    observer: &dyn ProvisionObserver,
) -> Result<Vec<TableStatus>, ProvisionError> {
    let session = acquire(connector, policy, observer)?;
    let mut session = SessionGuard::new(session, observer);

    let statuses: Vec<TableStatus> = tables
        .iter()
        .map(|spec| match check_table(&mut *session, spec.name(), observer) {
            Ok(exists) => TableStatus {
                name: spec.name().to_string(),
                exists: Some(exists),
                error: None,
            },
            Err(e) => TableStatus {
                name: spec.name().to_string(),
                exists: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    session.release();
    Ok(statuses)
}
