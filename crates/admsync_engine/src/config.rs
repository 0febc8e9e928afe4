//! Configuration for the synchronizer.

/// Configuration for sync operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Property stamped by the post-script and read by the version query.
    pub version_property: String,
    /// Statement switching the session into script mode.
    pub mode_switch: String,
    /// Line opening the script block.
    pub block_open: String,
    /// Line closing the script block.
    pub block_close: String,
    /// Statement leaving script mode.
    pub mode_exit: String,
    /// Whether history recording is suspended while a sync runs.
    pub suppress_history: bool,
    /// Whether `sync_if_changed` skips objects whose version matches.
    pub skip_unchanged: bool,
}

impl SyncConfig {
    /// Creates a configuration with the default markers.
    pub fn new() -> Self {
        Self {
            version_property: "version".to_string(),
            mode_switch: "tcl;".to_string(),
            block_open: "eval {".to_string(),
            block_close: "}".to_string(),
            mode_exit: "exit;".to_string(),
            suppress_history: true,
            skip_unchanged: true,
        }
    }

    /// Sets the version property name.
    pub fn with_version_property(mut self, property: impl Into<String>) -> Self {
        self.version_property = property.into();
        self
    }

    /// Sets the script mode markers.
    pub fn with_mode_markers(
        mut self,
        switch: impl Into<String>,
        open: impl Into<String>,
        close: impl Into<String>,
        exit: impl Into<String>,
    ) -> Self {
        self.mode_switch = switch.into();
        self.block_open = open.into();
        self.block_close = close.into();
        self.mode_exit = exit.into();
        self
    }

    /// Sets whether history is suspended during a sync.
    pub fn with_suppress_history(mut self, suppress: bool) -> Self {
        self.suppress_history = suppress;
        self
    }

    /// Sets whether unchanged objects are skipped.
    pub fn with_skip_unchanged(mut self, skip: bool) -> Self {
        self.skip_unchanged = skip;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.version_property, "version");
        assert_eq!(config.mode_switch, "tcl;");
        assert_eq!(config.block_open, "eval {");
        assert_eq!(config.block_close, "}");
        assert_eq!(config.mode_exit, "exit;");
        assert!(config.suppress_history);
        assert!(config.skip_unchanged);
    }

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new()
            .with_version_property("file date")
            .with_suppress_history(false)
            .with_skip_unchanged(false);

        assert_eq!(config.version_property, "file date");
        assert!(!config.suppress_history);
        assert!(!config.skip_unchanged);
    }
}
