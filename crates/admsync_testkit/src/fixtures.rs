//! Test fixtures: kinds, seeded stores and local definition files.

use crate::store::MemoryStore;
use admsync_engine::LocalMarker;
use admsync_model::{FileNaming, KindDescriptor};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The `attribute` kind with its type and default fields.
pub fn attribute_kind() -> KindDescriptor {
    KindDescriptor::admin("attribute", FileNaming::new("ATTRIBUTE_", ".tcl"))
        .with_field("/primitiveType", "type")
        .with_field("/defaultValue", "default")
        .ignore_on_reset("type")
}

/// The `table` kind, addressed with the `system` suffix.
pub fn table_kind() -> KindDescriptor {
    KindDescriptor::admin("table", FileNaming::new("TABLE_", ".tcl")).with_address_suffix("system")
}

/// Trigger parameter business objects.
pub fn trigger_kind() -> KindDescriptor {
    KindDescriptor::business(
        "eService Trigger Program Parameters",
        FileNaming::new("TRIGGER_", ".tcl"),
    )
}

/// A store knowing every fixture kind.
pub fn fixture_store() -> MemoryStore {
    MemoryStore::new()
        .with_kind(attribute_kind())
        .with_kind(table_kind())
        .with_kind(trigger_kind())
}

/// A store seeded with the `Weight` attribute.
///
/// `Weight` carries a description, a default value, the housekeeping
/// `author` property, an `X` property and two `P` properties referencing
/// types `A` and `B`.
pub fn seeded_store() -> MemoryStore {
    let store = fixture_store();
    store
        .run(concat!(
            "add attribute 'Weight' type real default 0 description \"Net weight\" ",
            "property \"author\" value \"Jane\" ",
            "property \"X\" value \"1\" ",
            "property \"P\" to type \"A\" ",
            "property \"P\" to type \"B\";",
        ))
        .expect("Failed to seed store");
    store
}

/// A directory of local definition files with automatic cleanup.
pub struct DefinitionDir {
    dir: TempDir,
}

impl DefinitionDir {
    /// Creates an empty definition directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the definition of `name` following the kind's file naming.
    pub fn write(&self, descriptor: &KindDescriptor, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(descriptor.file_naming.file_name(name));
        std::fs::write(&path, body).expect("Failed to write definition");
        path
    }

    /// Modification marker of a written definition.
    pub fn marker(&self, path: &Path) -> LocalMarker {
        LocalMarker::from_path(path).expect("Failed to read modification time")
    }
}

impl Default for DefinitionDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectKey;

    #[test]
    fn seeded_store_has_weight() {
        let store = seeded_store();
        let weight = store.get(&ObjectKey::admin("attribute", "Weight")).unwrap();
        assert_eq!(weight.description, "Net weight");
        assert_eq!(weight.properties.len(), 4);
        assert_eq!(weight.fields.len(), 2);
    }

    #[test]
    fn definitions_follow_file_naming() {
        let dir = DefinitionDir::new();
        let path = dir.write(&attribute_kind(), "Weight", "mql mod attribute $NAME;");
        assert_eq!(path.file_name().unwrap(), "ATTRIBUTE_Weight.tcl");
        assert!(dir.marker(&path).epoch_seconds() > 0);
    }
}
