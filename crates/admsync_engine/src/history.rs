//! Scoped suspension of history recording.

use crate::session::{RemoteSession, SessionResult};

/// Keeps history recording disabled while alive.
///
/// Dropping the guard re-enables recording; a failure there can only be
/// logged. Call [`HistoryGuard::release`] to observe it instead.
#[must_use = "history is re-enabled when the guard is dropped"]
pub struct HistoryGuard<'a, S: RemoteSession + ?Sized> {
    session: &'a S,
    active: bool,
}

impl<'a, S: RemoteSession + ?Sized> HistoryGuard<'a, S> {
    /// Disables history recording on `session`.
    pub fn disable(session: &'a S) -> SessionResult<Self> {
        session.disable_history()?;
        Ok(Self {
            session,
            active: true,
        })
    }

    /// Creates a guard that leaves history untouched.
    pub fn inactive(session: &'a S) -> Self {
        Self {
            session,
            active: false,
        }
    }

    /// Returns true if this guard re-enables history when released.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Re-enables history recording now.
    pub fn release(mut self) -> SessionResult<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.session.enable_history()
    }
}

impl<S: RemoteSession + ?Sized> Drop for HistoryGuard<'_, S> {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.session.enable_history() {
                tracing::error!(error = %e, "failed to re-enable history recording");
            }
        }
    }
}

impl<S: RemoteSession + ?Sized> std::fmt::Debug for HistoryGuard<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryGuard")
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MockSession;

    #[test]
    fn drop_reenables() {
        let session = MockSession::new();
        {
            let guard = HistoryGuard::disable(&session).unwrap();
            assert!(guard.is_active());
        }
        assert_eq!(session.calls(), vec!["disable_history", "enable_history"]);
    }

    #[test]
    fn release_reenables_once() {
        let session = MockSession::new();
        let guard = HistoryGuard::disable(&session).unwrap();
        guard.release().unwrap();
        assert_eq!(session.calls(), vec!["disable_history", "enable_history"]);
    }

    #[test]
    fn release_reports_failure() {
        let session = MockSession::new();
        session.fail("enable_history", "lost connection");
        let guard = HistoryGuard::disable(&session).unwrap();
        assert_eq!(guard.release().unwrap_err().message, "lost connection");
    }

    #[test]
    fn inactive_guard_does_nothing() {
        let session = MockSession::new();
        drop(HistoryGuard::inactive(&session));
        assert!(session.calls().is_empty());
    }

    #[test]
    fn failed_disable_leaves_nothing_to_restore() {
        let session = MockSession::new();
        session.fail("disable_history", "denied");
        assert!(HistoryGuard::disable(&session).is_err());
        assert_eq!(session.calls(), vec!["disable_history"]);
    }
}
