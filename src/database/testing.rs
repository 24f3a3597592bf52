//! In-process fakes for exercising runs without a database server

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::rc::Rc;

use super::core::{ConnectionFailure, Connector, DbError, ReconcileError, Session};
use crate::observer::ProvisionObserver;
use crate::provision::{ProvisionError, ProvisionReport};

/// Everything a [`FakeSession`] saw, shared with the test after the session
/// has been consumed
#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub existing: BTreeSet<String>,
    pub failing_checks: BTreeSet<String>,
    pub fail_savepoint: bool,
    pub fail_release: bool,
    pub fail_commit: bool,
    pub fail_close: bool,
    pub ddl: Vec<String>,
    pub savepoints: usize,
    pub releases: usize,
    pub rollbacks: usize,
    pub commits: usize,
    pub closes: usize,
}

pub(crate) type SharedState = Rc<RefCell<FakeState>>;

fn backend_error() -> DbError {
    DbError::Sqlite(rusqlite::Error::InvalidQuery)
}

/// Scripted session
///
/// Statements containing `BROKEN` fail. A successful `CREATE TABLE <name>`
/// adds `<name>` to the existing tables.
#[derive(Debug)]
pub(crate) struct FakeSession {
    state: SharedState,
}

impl FakeSession {
    pub fn new() -> (Self, SharedState) {
        let state = SharedState::default();
        (Self::with_state(state.clone()), state)
    }

    pub fn with_state(state: SharedState) -> Self {
        Self { state }
    }
}

impl Session for FakeSession {
    fn table_exists(&mut self, name: &str) -> Result<bool, DbError> {
        let state = self.state.borrow();
        if state.failing_checks.contains(name) {
            return Err(backend_error());
        }
        Ok(state.existing.contains(name))
    }

    fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        if sql.contains("BROKEN") {
            return Err(backend_error());
        }
        let mut state = self.state.borrow_mut();
        state.ddl.push(sql.to_string());
        if let Some(name) = sql.split_whitespace().nth(2) {
            state.existing.insert(name.to_string());
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DbError> {
        let mut state = self.state.borrow_mut();
        state.commits += 1;
        if state.fail_commit {
            return Err(backend_error());
        }
        Ok(())
    }

    fn close(self) -> Result<(), DbError> {
        let mut state = self.state.borrow_mut();
        state.closes += 1;
        if state.fail_close {
            return Err(backend_error());
        }
        Ok(())
    }

    fn savepoint(&mut self, _name: &str) -> Result<(), DbError> {
        let mut state = self.state.borrow_mut();
        if state.fail_savepoint {
            return Err(backend_error());
        }
        state.savepoints += 1;
        Ok(())
    }

    fn release_savepoint(&mut self, _name: &str) -> Result<(), DbError> {
        let mut state = self.state.borrow_mut();
        state.releases += 1;
        if state.fail_release {
            return Err(backend_error());
        }
        Ok(())
    }

    fn rollback_to_savepoint(&mut self, _name: &str) -> Result<(), DbError> {
        self.state.borrow_mut().rollbacks += 1;
        Ok(())
    }
}

/// Connector whose first `failures` attempts fail
///
/// Every session it opens shares one [`FakeState`], standing in for a single
/// database that outlives sessions.
pub(crate) struct FakeConnector {
    pub state: SharedState,
    failures: Cell<u32>,
    permanent: bool,
    opened: Cell<u32>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::failing(0)
    }

    pub fn failing(failures: u32) -> Self {
        Self {
            state: SharedState::default(),
            failures: Cell::new(failures),
            permanent: false,
            opened: Cell::new(0),
        }
    }

    pub fn misconfigured() -> Self {
        Self {
            permanent: true,
            ..Self::new()
        }
    }

    /// Number of connection attempts made
    pub fn opened(&self) -> u32 {
        self.opened.get()
    }
}

impl Connector for FakeConnector {
    type Session = FakeSession;

    fn target(&self) -> String {
        "fake://db".to_string()
    }

    fn connect(&self) -> Result<FakeSession, DbError> {
        self.opened.set(self.opened.get() + 1);
        if self.permanent {
            return Err(DbError::MissingSetting("host"));
        }
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(DbError::Sqlite(rusqlite::Error::InvalidPath(
                PathBuf::from("unreachable"),
            )));
        }
        Ok(FakeSession::with_state(self.state.clone()))
    }
}

/// Observer that records events as `kind` or `kind:table` strings
#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
    events: RefCell<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Number of events of the given kind
    pub fn count(&self, kind: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.split(':').next() == Some(kind))
            .count()
    }

    fn push(&self, event: String) {
        self.events.borrow_mut().push(event);
    }
}

impl ProvisionObserver for RecordingObserver {
    fn connect_attempt(&self, _target: &str, attempt: u32, max_attempts: u32) {
        self.push(format!("connect_attempt:{}/{}", attempt, max_attempts));
    }

    fn connect_failed(&self, _target: &str, attempt: u32, _max_attempts: u32, _error: &DbError) {
        self.push(format!("connect_failed:{}", attempt));
    }

    fn connected(&self, _target: &str) {
        self.push("connected".to_string());
    }

    fn connect_abandoned(&self, failure: &ConnectionFailure) {
        self.push(format!("connect_abandoned:{}", failure.attempts));
    }

    fn checking_table(&self, table: &str) {
        self.push(format!("checking:{}", table));
    }

    fn table_exists(&self, table: &str) {
        self.push(format!("exists:{}", table));
    }

    fn table_missing(&self, table: &str) {
        self.push(format!("missing:{}", table));
    }

    fn creating_table(&self, table: &str) {
        self.push(format!("creating:{}", table));
    }

    fn table_created(&self, table: &str) {
        self.push(format!("created:{}", table));
    }

    fn table_failed(&self, error: &ReconcileError) {
        self.push(format!("failed:{}", error.table()));
    }

    fn committing(&self) {
        self.push("committing".to_string());
    }

    fn committed(&self, _report: &ProvisionReport) {
        self.push("committed".to_string());
    }

    fn run_failed(&self, _error: &ProvisionError) {
        self.push("run_failed".to_string());
    }

    fn session_released(&self) {
        self.push("released".to_string());
    }

    fn release_failed(&self, _error: &DbError) {
        self.push("release_failed".to_string());
    }
}
