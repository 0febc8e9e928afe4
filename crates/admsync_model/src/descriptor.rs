//! Per-kind capability tables.
//!
//! Every object kind is described by a [`KindDescriptor`] value instead of
//! a type of its own: the descriptor names the kind, tells the builder which
//! export paths feed which fields, and tells the synchronizer which fields a
//! reset must leave alone.

use admsync_decode::LogicalPath;
use std::collections::BTreeSet;

/// Separator between base name and revision in a business object's
/// external name.
pub const REVISION_SEPARATOR: &str = "________";

/// Export paths shared by all admin kinds.
pub mod admin_paths {
    /// Object name.
    pub const NAME: &str = "/adminProperties/name";
    /// Description.
    pub const DESCRIPTION: &str = "/adminProperties/description";
    /// Presence marks the object hidden.
    pub const HIDDEN: &str = "/adminProperties/hidden";
    /// Root of the property list.
    pub const PROPERTY_LIST: &str = "/adminProperties/propertyList";
}

/// Export paths used by business objects.
pub mod business_paths {
    /// Business type.
    pub const TYPE: &str = "/businessObjectRef/objectType";
    /// Base name.
    pub const NAME: &str = "/businessObjectRef/objectName";
    /// Revision.
    pub const REVISION: &str = "/businessObjectRef/objectRevision";
    /// Internal object id.
    pub const OBJECT_ID: &str = "/objectId";
    /// Vault.
    pub const VAULT: &str = "/vaultRef";
    /// Description.
    pub const DESCRIPTION: &str = "/description";
    /// Root of the attribute list.
    pub const ATTRIBUTE_LIST: &str = "/attributeList";
}

/// File naming convention for locally held definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileNaming {
    /// File name prefix, e.g. `ATTRIBUTE_`.
    pub prefix: String,
    /// File name suffix, e.g. `.tcl`.
    pub suffix: String,
}

impl FileNaming {
    /// Creates a naming convention.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Builds the file name for an object.
    pub fn file_name(&self, object_name: &str) -> String {
        format!("{}{object_name}{}", self.prefix, self.suffix)
    }

    /// Extracts the object name from a file name following this convention.
    pub fn object_name<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// Shape of the objects of a kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectShape {
    /// Plain admin object addressed by name.
    Admin,
    /// Revisioned business object of the given business type.
    Business {
        /// Business type name.
        business_type: String,
    },
}

/// Where a bound export path is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    /// Object name (base name for business objects).
    Name,
    /// Description.
    Description,
    /// Hidden flag; set by the presence of the element.
    Hidden,
    /// Business object revision.
    Revision,
    /// Business object vault.
    Vault,
    /// Business object internal id.
    ObjectId,
    /// Business type as reported by the export.
    BusinessType,
    /// Kind-specific field stored under the given name.
    Field(String),
}

/// Binds one export path to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    /// Exact export path.
    pub path: LogicalPath,
    /// Destination.
    pub target: FieldTarget,
}

/// Capability table for one object kind.
///
/// # Example
///
/// ```
/// use admsync_model::{FieldTarget, FileNaming, KindDescriptor};
///
/// let attribute = KindDescriptor::admin("attribute", FileNaming::new("ATTRIBUTE_", ".tcl"))
///     .with_field("/primitiveType", "type")
///     .with_field("/defaultValue", "default")
///     .ignore_on_reset("type");
///
/// assert_eq!(attribute.kind_name, "attribute");
/// assert!(attribute.is_ignored_on_reset("type"));
/// assert_eq!(attribute.file_naming.file_name("Weight"), "ATTRIBUTE_Weight.tcl");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindDescriptor {
    /// Kind name used in commands, e.g. `attribute`.
    pub kind_name: String,
    /// Extra address token appended after the name, e.g. `system`.
    pub address_suffix: Option<String>,
    /// Local file naming convention.
    pub file_naming: FileNaming,
    /// Plain admin object or business object.
    pub shape: ObjectShape,
    /// Root of the property list, if the kind has properties.
    pub property_root: Option<LogicalPath>,
    /// Root of the attribute list, for business objects.
    pub attribute_root: Option<LogicalPath>,
    /// Path-to-field bindings.
    pub fields: Vec<FieldBinding>,
    /// Fields a reset block must not clear.
    pub ignored_on_reset: BTreeSet<String>,
}

impl KindDescriptor {
    /// Creates a descriptor for a plain admin kind with the shared bindings.
    pub fn admin(kind_name: impl Into<String>, file_naming: FileNaming) -> Self {
        Self {
            kind_name: kind_name.into(),
            address_suffix: None,
            file_naming,
            shape: ObjectShape::Admin,
            property_root: Some(LogicalPath::parse(admin_paths::PROPERTY_LIST)),
            attribute_root: None,
            fields: vec![
                FieldBinding {
                    path: LogicalPath::parse(admin_paths::NAME),
                    target: FieldTarget::Name,
                },
                FieldBinding {
                    path: LogicalPath::parse(admin_paths::DESCRIPTION),
                    target: FieldTarget::Description,
                },
                FieldBinding {
                    path: LogicalPath::parse(admin_paths::HIDDEN),
                    target: FieldTarget::Hidden,
                },
            ],
            ignored_on_reset: BTreeSet::new(),
        }
    }

    /// Creates a descriptor for business objects of `business_type`.
    pub fn business(business_type: impl Into<String>, file_naming: FileNaming) -> Self {
        let bindings = [
            (business_paths::TYPE, FieldTarget::BusinessType),
            (business_paths::NAME, FieldTarget::Name),
            (business_paths::REVISION, FieldTarget::Revision),
            (business_paths::OBJECT_ID, FieldTarget::ObjectId),
            (business_paths::VAULT, FieldTarget::Vault),
            (business_paths::DESCRIPTION, FieldTarget::Description),
        ];
        Self {
            kind_name: "bus".to_string(),
            address_suffix: None,
            file_naming,
            shape: ObjectShape::Business {
                business_type: business_type.into(),
            },
            property_root: None,
            attribute_root: Some(LogicalPath::parse(business_paths::ATTRIBUTE_LIST)),
            fields: bindings
                .into_iter()
                .map(|(path, target)| FieldBinding {
                    path: LogicalPath::parse(path),
                    target,
                })
                .collect(),
            ignored_on_reset: BTreeSet::new(),
        }
    }

    /// Sets the address suffix.
    pub fn with_address_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.address_suffix = Some(suffix.into());
        self
    }

    /// Binds an export path to a kind-specific field.
    pub fn with_field(mut self, path: &str, field: impl Into<String>) -> Self {
        self.fields.push(FieldBinding {
            path: LogicalPath::parse(path),
            target: FieldTarget::Field(field.into()),
        });
        self
    }

    /// Declares a field that the reset block must not clear.
    pub fn ignore_on_reset(mut self, field: impl Into<String>) -> Self {
        self.ignored_on_reset.insert(field.into());
        self
    }

    /// Returns true if `field` is skipped by the reset block.
    pub fn is_ignored_on_reset(&self, field: &str) -> bool {
        self.ignored_on_reset.contains(field)
    }

    /// Returns true if this kind describes business objects.
    pub fn is_business(&self) -> bool {
        matches!(self.shape, ObjectShape::Business { .. })
    }

    /// Returns true if the kind binds a kind-specific field called `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields
            .iter()
            .any(|b| matches!(&b.target, FieldTarget::Field(name) if name == field))
    }

    /// Finds the binding for an exact export path.
    pub fn binding(&self, path: &LogicalPath) -> Option<&FieldBinding> {
        self.fields.iter().find(|b| &b.path == path)
    }

    /// Returns true if `path` is a container of some bound path.
    ///
    /// Such structural elements carry no value of their own and are not
    /// reported as unrecognized.
    pub fn is_container(&self, path: &LogicalPath) -> bool {
        self.fields
            .iter()
            .map(|b| &b.path)
            .chain(self.property_root.iter())
            .chain(self.attribute_root.iter())
            .any(|bound| bound.len() > path.len() && bound.starts_with(path))
    }
}
