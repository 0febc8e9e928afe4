//! Transactional synchronization of single objects.

use crate::change::{needs_sync, LocalMarker, RemoteVersion};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::history::HistoryGuard;
use crate::script::{ScriptBuilder, SyncReport, UpdateRequest};
use crate::session::RemoteSession;
use crate::transaction::TransactionGuard;
use admsync_decode::{DecodeConfig, DecodeError};
use admsync_model::{decode_object, KindDescriptor, ObjectAddress, SyncObject};
use std::sync::Arc;

/// Result of [`Synchronizer::sync_if_changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote version matched; nothing was executed.
    Unchanged,
    /// The object was synchronized.
    Applied(SyncReport),
}

/// Synchronizes objects through one remote session.
///
/// Each call is sequential and holds no state beyond the call; run
/// several synchronizers, one per session, to work on different objects
/// in parallel.
pub struct Synchronizer<S: RemoteSession> {
    config: SyncConfig,
    decode: DecodeConfig,
    session: Arc<S>,
}

impl<S: RemoteSession> Synchronizer<S> {
    /// Creates a synchronizer owning `session`.
    pub fn new(config: SyncConfig, session: S) -> Self {
        Self::with_shared(config, Arc::new(session))
    }

    /// Creates a synchronizer over a shared session.
    pub fn with_shared(config: SyncConfig, session: Arc<S>) -> Self {
        Self {
            config,
            decode: DecodeConfig::default(),
            session,
        }
    }

    /// Sets the decoder configuration used for exports.
    pub fn with_decode_config(mut self, decode: DecodeConfig) -> Self {
        self.decode = decode;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Exports and decodes the object called `name`.
    ///
    /// An object that does not exist yet decodes as a blank object
    /// carrying only its name.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Decode`] if the export cannot be retrieved or
    /// consumed.
    pub fn export(&self, descriptor: &KindDescriptor, name: &str) -> SyncResult<SyncObject> {
        let address = ObjectAddress::for_name(descriptor, name);
        let document = self
            .session
            .export(&address)
            .map_err(|e| {
                let source = DecodeError::unavailable(e.message);
                SyncError::decode(&descriptor.kind_name, name, source)
            })?;

        match document {
            Some(document) => decode_object(descriptor, document.as_bytes(), &self.decode)
                .map_err(|e| SyncError::decode(&descriptor.kind_name, name, e)),
            None => {
                tracing::debug!(kind = %descriptor.kind_name, name, "object does not exist yet");
                Ok(SyncObject::placeholder(descriptor, name))
            }
        }
    }

    /// Reads the remote version marker of the object called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::VersionQuery`] if the query fails.
    pub fn remote_version(
        &self,
        descriptor: &KindDescriptor,
        name: &str,
    ) -> SyncResult<RemoteVersion> {
        let address = ObjectAddress::for_name(descriptor, name);
        let marker = self
            .session
            .version_marker(&address, &self.config.version_property)
            .map_err(|e| SyncError::version_query(&descriptor.kind_name, name, &e))?;
        Ok(RemoteVersion::parse(&marker))
    }

    /// Returns true if the object differs from a local definition
    /// modified at `local`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::VersionQuery`] if the version query fails.
    pub fn needs_sync(
        &self,
        descriptor: &KindDescriptor,
        name: &str,
        local: LocalMarker,
    ) -> SyncResult<bool> {
        let address = ObjectAddress::for_name(descriptor, name);
        let marker = self
            .session
            .version_marker(&address, &self.config.version_property)
            .map_err(|e| SyncError::version_query(&descriptor.kind_name, name, &e))?;
        Ok(needs_sync(&marker, local))
    }

    /// Plans the script a sync of `name` would execute, without running it.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be exported or the request is
    /// invalid.
    pub fn plan(
        &self,
        descriptor: &KindDescriptor,
        name: &str,
        request: &UpdateRequest,
    ) -> SyncResult<SyncReport> {
        let object = self.export(descriptor, name)?;
        ScriptBuilder::new(&self.config).plan(descriptor, &object, request)
    }

    /// Resets the object called `name` and reapplies its definition.
    ///
    /// The object is re-decoded first, then history is suspended and the
    /// generated script runs in one transaction. Any failure aborts the
    /// transaction and re-enables history before the error is returned.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Decode`] if the re-decode fails; nothing was executed
    /// - [`SyncError::Transaction`] if the script or commit fails; the
    ///   transaction was aborted
    /// - [`SyncError::HistoryRestore`] if history could not be re-enabled
    ///   after a successful commit
    pub fn sync(
        &self,
        descriptor: &KindDescriptor,
        name: &str,
        request: &UpdateRequest,
    ) -> SyncResult<SyncReport> {
        let kind = descriptor.kind_name.as_str();
        let object = self.export(descriptor, name)?;

        let session = self.session.as_ref();
        let history = if self.config.suppress_history {
            HistoryGuard::disable(session)
                .map_err(|e| SyncError::transaction(kind, name, &e))?
        } else {
            HistoryGuard::inactive(session)
        };

        let report = ScriptBuilder::new(&self.config).plan(descriptor, &object, request)?;

        let txn = TransactionGuard::begin(session)
            .map_err(|e| SyncError::transaction(kind, name, &e))?;
        if let Err(e) = txn.execute(&report.script) {
            tracing::warn!(kind, name, error = %e, "sync script failed, aborting");
            drop(txn);
            return Err(SyncError::transaction(kind, name, &e));
        }
        if let Err(e) = txn.commit() {
            tracing::warn!(kind, name, error = %e, "commit failed, aborting");
            return Err(SyncError::transaction(kind, name, &e));
        }

        history.release().map_err(|e| {
            tracing::error!(kind, name, error = %e, "history not restored after commit");
            SyncError::history_restore(kind, name, &e)
        })?;

        tracing::info!(
            kind,
            name,
            reset = report.reset_statements,
            stamp = %report.stamp,
            "object synchronized"
        );
        Ok(report)
    }

    /// Synchronizes the object only if its remote version differs from the
    /// request's stamp.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`needs_sync`](Self::needs_sync) and
    /// [`sync`](Self::sync).
    pub fn sync_if_changed(
        &self,
        descriptor: &KindDescriptor,
        name: &str,
        request: &UpdateRequest,
    ) -> SyncResult<SyncOutcome> {
        if self.config.skip_unchanged && !self.needs_sync(descriptor, name, request.stamp)? {
            tracing::debug!(kind = %descriptor.kind_name, name, "object unchanged, skipping");
            return Ok(SyncOutcome::Unchanged);
        }
        self.sync(descriptor, name, request).map(SyncOutcome::Applied)
    }
}

impl<S: RemoteSession> std::fmt::Debug for Synchronizer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MockSession;
    use admsync_model::FileNaming;

    const WEIGHT: &str = r#"<ematrix>
  <attributeDef>
    <adminProperties>
      <name>Weight</name>
      <description>Net weight</description>
      <propertyList>
        <property><name>author</name><value>Jane</value></property>
        <property><name>X</name><value>1</value></property>
      </propertyList>
    </adminProperties>
  </attributeDef>
</ematrix>"#;

    fn attribute() -> KindDescriptor {
        KindDescriptor::admin("attribute", FileNaming::new("ATTRIBUTE_", ".tcl"))
    }

    fn weight_address() -> ObjectAddress {
        ObjectAddress::for_name(&attribute(), "Weight")
    }

    fn synchronizer() -> Synchronizer<MockSession> {
        let session = MockSession::new();
        session.set_export(&weight_address(), WEIGHT);
        Synchronizer::new(SyncConfig::default(), session)
    }

    #[test]
    fn sync_call_order() {
        let sync = synchronizer();
        let request = UpdateRequest::new("").with_stamp(LocalMarker::from_epoch_seconds(5));
        let report = sync.sync(&attribute(), "Weight", &request).unwrap();

        assert_eq!(
            sync.session().calls(),
            vec!["export", "disable_history", "begin", "execute", "commit", "enable_history"]
        );
        assert_eq!(report.reset_statements, 2);
        assert_eq!(sync.session().scripts(), vec![report.script]);
    }

    #[test]
    fn failed_body_aborts_then_restores_history() {
        let sync = synchronizer();
        sync.session().fail("execute", "Error: #1900068: no such attribute");
        let err = sync
            .sync(&attribute(), "Weight", &UpdateRequest::new("bad"))
            .unwrap_err();

        match err {
            SyncError::Transaction { kind, name, message } => {
                assert_eq!(kind, "attribute");
                assert_eq!(name, "Weight");
                assert_eq!(message, "Error: #1900068: no such attribute");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            sync.session().calls(),
            vec!["export", "disable_history", "begin", "execute", "abort", "enable_history"]
        );
    }

    #[test]
    fn failed_export_executes_nothing() {
        let sync = synchronizer();
        sync.session().fail("export", "not connected");
        let err = sync
            .sync(&attribute(), "Weight", &UpdateRequest::new(""))
            .unwrap_err();
        assert!(matches!(err, SyncError::Decode { .. }));
        assert_eq!(sync.session().calls(), vec!["export"]);
    }

    #[test]
    fn history_restore_failure_is_fatal() {
        let sync = synchronizer();
        sync.session().fail("enable_history", "lost connection");
        let err = sync
            .sync(&attribute(), "Weight", &UpdateRequest::new(""))
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("attribute 'Weight'"));
        assert!(sync.session().calls().contains(&"commit".to_string()));
    }

    #[test]
    fn history_left_alone_when_not_suppressed() {
        let session = MockSession::new();
        let sync = Synchronizer::new(SyncConfig::new().with_suppress_history(false), session);
        sync.sync(&attribute(), "New", &UpdateRequest::new("")).unwrap();
        assert_eq!(sync.session().calls(), vec!["export", "begin", "execute", "commit"]);
    }

    #[test]
    fn unchanged_object_is_skipped() {
        let sync = synchronizer();
        sync.session().set_version(&weight_address(), "100");

        let same = UpdateRequest::new("").with_stamp(LocalMarker::from_epoch_seconds(100));
        assert_eq!(
            sync.sync_if_changed(&attribute(), "Weight", &same).unwrap(),
            SyncOutcome::Unchanged
        );
        assert_eq!(sync.session().calls(), vec!["version_marker"]);

        let newer = UpdateRequest::new("").with_stamp(LocalMarker::from_epoch_seconds(101));
        assert!(matches!(
            sync.sync_if_changed(&attribute(), "Weight", &newer).unwrap(),
            SyncOutcome::Applied(_)
        ));
    }

    #[test]
    fn missing_object_decodes_blank() {
        let sync = synchronizer();
        let object = sync.export(&attribute(), "Missing").unwrap();
        assert_eq!(object.name(), "Missing");
        assert!(object.is_blank());

        let trigger = KindDescriptor::business("Trigger", FileNaming::default());
        let object = sync.export(&trigger, "Check________2").unwrap();
        assert_eq!(object.name(), "Check________2");
    }

    #[test]
    fn failed_version_query_names_object() {
        let sync = synchronizer();
        sync.session().fail("version_marker", "Error: #1500001: connection reset");
        let request = UpdateRequest::new("").with_stamp(LocalMarker::from_epoch_seconds(1));

        let err = sync
            .sync_if_changed(&attribute(), "Weight", &request)
            .unwrap_err();
        match err {
            SyncError::VersionQuery { kind, name, message } => {
                assert_eq!(kind, "attribute");
                assert_eq!(name, "Weight");
                assert_eq!(message, "Error: #1500001: connection reset");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(sync.session().calls(), vec!["version_marker"]);
    }
}
