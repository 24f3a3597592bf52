//! Session acquisition with bounded retry

use std::thread;
use std::time::Duration;

use thiserror::Error;

use super::{DbError, Session};
use crate::observer::ProvisionObserver;

/// Default number of connection attempts
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;

/// Default pause between connection attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Something that can open a [`Session`]
pub trait Connector {
    type Session: Session;

    /// Human-readable description of where sessions are opened, without secrets
    fn target(&self) -> String;

    /// Make a single connection attempt
    fn connect(&self) -> Result<Self::Session, DbError>;
}

/// Fixed-delay retry policy for [`acquire`]
///
/// Intended for a database that is still starting up: it tolerates a short
/// window of unavailability, not a sustained outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Sleep between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    pub fn max_attempts(&self) -> u32 {
        self.attempts.max(1)
    }
}

/// Every connection attempt failed, or one failed permanently
#[derive(Debug, Error)]
#[error("could not connect to {target} after {attempts} attempt(s): {source}")]
pub struct ConnectionFailure {
    pub target: String,
    pub attempts: u32,
    #[source]
    pub source: DbError,
}

/// Open a session, retrying transient failures according to `policy`
///
/// Attempts are sequential and blocking. A permanent failure (see
/// [`DbError::is_transient`]) ends the loop without sleeping.
pub fn acquire<C: Connector>(
    connector: &C,
    policy: &RetryPolicy,
    observer: &dyn ProvisionObserver,
) -> Result<C::Session, ConnectionFailure> {
    let target = connector.target();
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        observer.connect_attempt(&target, attempt, max_attempts);

        match connector.connect() {
            Ok(session) => {
                observer.connected(&target);
                return Ok(session);
            }
            Err(error) => {
                observer.connect_failed(&target, attempt, max_attempts, &error);
                if attempt >= max_attempts || !error.is_transient() {
                    let failure = ConnectionFailure {
                        target,
                        attempts: attempt,
                        source: error,
                    };
                    observer.connect_abandoned(&failure);
                    return Err(failure);
                }
                thread::sleep(policy.delay);
            }
        }
    }
}
