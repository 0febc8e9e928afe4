//! Transaction scoping over a remote session.

use crate::session::{RemoteSession, SessionResult};

/// An open remote transaction.
///
/// The transaction is aborted when the guard is dropped without a
/// successful [`commit`](TransactionGuard::commit).
#[must_use = "the transaction is aborted when the guard is dropped"]
pub struct TransactionGuard<'a, S: RemoteSession + ?Sized> {
    session: &'a S,
    open: bool,
}

impl<'a, S: RemoteSession + ?Sized> TransactionGuard<'a, S> {
    /// Begins a transaction on `session`.
    pub fn begin(session: &'a S) -> SessionResult<Self> {
        session.begin()?;
        Ok(Self {
            session,
            open: true,
        })
    }

    /// Runs a script inside the transaction.
    pub fn execute(&self, script: &str) -> SessionResult<String> {
        self.session.execute(script)
    }

    /// Commits the transaction.
    ///
    /// A failed commit leaves the transaction to be aborted on drop.
    pub fn commit(mut self) -> SessionResult<()> {
        self.session.commit()?;
        self.open = false;
        Ok(())
    }

    /// Aborts the transaction.
    pub fn abort(mut self) -> SessionResult<()> {
        self.open = false;
        self.session.abort()
    }
}

impl<S: RemoteSession + ?Sized> Drop for TransactionGuard<'_, S> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.session.abort() {
                tracing::warn!(error = %e, "failed to abort transaction");
            }
        }
    }
}

impl<S: RemoteSession + ?Sized> std::fmt::Debug for TransactionGuard<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionGuard")
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MockSession;

    #[test]
    fn commit_closes() {
        let session = MockSession::new();
        let txn = TransactionGuard::begin(&session).unwrap();
        txn.execute("print context;").unwrap();
        txn.commit().unwrap();
        assert_eq!(session.calls(), vec!["begin", "execute", "commit"]);
    }

    #[test]
    fn drop_aborts() {
        let session = MockSession::new();
        session.fail("execute", "boom");
        {
            let txn = TransactionGuard::begin(&session).unwrap();
            assert!(txn.execute("bad").is_err());
        }
        assert_eq!(session.calls(), vec!["begin", "execute", "abort"]);
    }

    #[test]
    fn failed_commit_aborts() {
        let session = MockSession::new();
        session.fail("commit", "deadlock");
        let txn = TransactionGuard::begin(&session).unwrap();
        assert!(txn.commit().is_err());
        assert_eq!(session.calls(), vec!["begin", "commit", "abort"]);
    }

    #[test]
    fn explicit_abort_runs_once() {
        let session = MockSession::new();
        let txn = TransactionGuard::begin(&session).unwrap();
        txn.abort().unwrap();
        assert_eq!(session.calls(), vec!["begin", "abort"]);
    }
}
