//! Progress and diagnostic events of a provisioning run
//!
//! The connector, reconciler and driver report what they do through a
//! [`ProvisionObserver`] handed to them by the caller. [`TracingObserver`]
//! turns the events into `tracing` log lines; [`NoopObserver`] drops them.

use tracing::{error, info};

use crate::database::{ConnectionFailure, DbError, ReconcileError};
use crate::provision::{ProvisionError, ProvisionReport};

/// Receiver of run events. Every method defaults to doing nothing.
pub trait ProvisionObserver {
    fn connect_attempt(&self, _target: &str, _attempt: u32, _max_attempts: u32) {}

    fn connect_failed(&self, _target: &str, _attempt: u32, _max_attempts: u32, _error: &DbError) {
    }

    fn connected(&self, _target: &str) {}

    /// No further attempts will be made
    fn connect_abandoned(&self, _failure: &ConnectionFailure) {}

    fn checking_table(&self, _table: &str) {}

    fn table_exists(&self, _table: &str) {}

    fn table_missing(&self, _table: &str) {}

    fn creating_table(&self, _table: &str) {}

    fn table_created(&self, _table: &str) {}

    fn table_failed(&self, _error: &ReconcileError) {}

    fn committing(&self) {}

    fn committed(&self, _report: &ProvisionReport) {}

    fn run_failed(&self, _error: &ProvisionError) {}

    fn session_released(&self) {}

    fn release_failed(&self, _error: &DbError) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProvisionObserver for NoopObserver {}

/// Observer that logs through `tracing`: INFO for progress, ERROR for failures
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProvisionObserver for TracingObserver {
    fn connect_attempt(&self, target: &str, attempt: u32, max_attempts: u32) {
        info!("connecting to {} (attempt {}/{})", target, attempt, max_attempts);
    }

    fn connect_failed(&self, target: &str, attempt: u32, max_attempts: u32, error: &DbError) {
        error!(
            "failed to connect to {}, attempt {}/{}: {}",
            target, attempt, max_attempts, error
        );
    }

    fn connected(&self, target: &str) {
        info!("successfully connected to {}", target);
    }

    fn connect_abandoned(&self, failure: &ConnectionFailure) {
        error!("{}; not touching any table", failure);
    }

    fn checking_table(&self, table: &str) {
        info!("checking if table {} exists", table);
    }

    fn table_exists(&self, table: &str) {
        info!("table {} already exists, skipping creation", table);
    }

    fn table_missing(&self, table: &str) {
        info!("table {} does not exist", table);
    }

    fn creating_table(&self, table: &str) {
        info!("creating table {}", table);
    }

    fn table_created(&self, table: &str) {
        info!("table {} created successfully", table);
    }

    fn table_failed(&self, error: &ReconcileError) {
        error!("{}", error);
    }

    fn committing(&self) {
        info!("committing schema changes");
    }

    fn committed(&self, report: &ProvisionReport) {
        info!(
            created = report.created(),
            skipped = report.skipped(),
            failed = report.failed(),
            "schema changes committed"
        );
    }

    fn run_failed(&self, error: &ProvisionError) {
        error!("provisioning failed: {}", error);
    }

    fn session_released(&self) {
        info!("database connection closed");
    }

    fn release_failed(&self, error: &DbError) {
        error!("failed to close database connection: {}", error);
    }
}
