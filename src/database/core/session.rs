//! Session abstraction and scoped release
//!
//! A [`Session`] is one open database handle with an implicit transaction.
//! [`SessionGuard`] owns it for the length of a run and closes it exactly
//! once, either through [`SessionGuard::release`] or on drop.

use std::ops::{Deref, DerefMut};

use super::DbError;
use crate::observer::ProvisionObserver;

/// An open database handle carrying an implicit transaction
///
/// The transaction is begun when the session is opened and ends with
/// [`Session::commit`]. Closing a session with uncommitted work discards it.
pub trait Session {
    /// Check the catalog for a table with exactly this name
    fn table_exists(&mut self, name: &str) -> Result<bool, DbError>;

    /// Execute a statement verbatim
    fn execute(&mut self, sql: &str) -> Result<(), DbError>;

    /// Commit the session's transaction
    fn commit(&mut self) -> Result<(), DbError>;

    /// Close the underlying connection
    fn close(self) -> Result<(), DbError>
    where
        Self: Sized;

    fn savepoint(&mut self, name: &str) -> Result<(), DbError> {
        self.execute(&format!("SAVEPOINT {}", name))
    }

    fn release_savepoint(&mut self, name: &str) -> Result<(), DbError> {
        self.execute(&format!("RELEASE SAVEPOINT {}", name))
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), DbError> {
        self.execute(&format!("ROLLBACK TO SAVEPOINT {}", name))
    }
}

/// Exclusive owner of a session that guarantees a single close
///
/// Dereferences to the wrapped session. The session is present from
/// construction until `release` or drop takes it.
pub struct SessionGuard<'o, S: Session> {
    session: Option<S>,
    observer: &'o dyn ProvisionObserver,
}

impl<'o, S: Session> SessionGuard<'o, S> {
    pub fn new(session: S, observer: &'o dyn ProvisionObserver) -> Self {
        Self {
            session: Some(session),
            observer,
        }
    }

    /// Close the session now instead of at end of scope
    pub fn release(mut self) {
        self.close_session();
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            match session.close() {
                Ok(()) => self.observer.session_released(),
                Err(e) => self.observer.release_failed(&e),
            }
        }
    }
}

impl<S: Session> Deref for SessionGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        match self.session.as_ref() {
            Some(session) => session,
            None => unreachable!("session accessed after release"),
        }
    }
}

impl<S: Session> DerefMut for SessionGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        match self.session.as_mut() {
            Some(session) => session,
            None => unreachable!("session accessed after release"),
        }
    }
}

impl<S: Session> Drop for SessionGuard<'_, S> {
    fn drop(&mut self) {
        self.close_session();
    }
}
