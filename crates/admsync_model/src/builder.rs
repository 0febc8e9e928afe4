//! Builds objects from decoded export events.

use crate::attribute::AttributeCollector;
use crate::descriptor::{FieldTarget, KindDescriptor};
use crate::object::{Installation, SyncObject};
use crate::property::{PropertyCanonicalizer, PropertyMap};
use admsync_decode::{events, DecodeConfig, DecodeResult, DecodedEvent};
use std::io::BufRead;

/// Accumulates the events of one export into a [`SyncObject`].
///
/// Routing order per event: property list, attribute list, exact field
/// binding, known container. Anything else is logged and ignored, since
/// newer platform versions add optional elements.
#[derive(Debug)]
pub struct ObjectBuilder<'a> {
    descriptor: &'a KindDescriptor,
    object: SyncObject,
    properties: Option<PropertyCanonicalizer>,
    attributes: Option<AttributeCollector>,
}

impl<'a> ObjectBuilder<'a> {
    /// Creates a builder for an object of the given kind.
    pub fn new(descriptor: &'a KindDescriptor) -> Self {
        Self {
            descriptor,
            object: SyncObject::empty(descriptor),
            properties: descriptor.property_root.clone().map(PropertyCanonicalizer::new),
            attributes: descriptor.attribute_root.clone().map(AttributeCollector::new),
        }
    }

    /// Applies one event.
    pub fn accept(&mut self, event: &DecodedEvent) {
        if let Some(properties) = &mut self.properties {
            if properties.accept(event) {
                return;
            }
        }
        if let Some(attributes) = &mut self.attributes {
            if attributes.accept(event) {
                return;
            }
        }
        if let Some(binding) = self.descriptor.binding(&event.path) {
            let target = binding.target.clone();
            self.apply(&target, event);
            return;
        }
        if !self.descriptor.is_container(&event.path) {
            tracing::debug!(
                kind = %self.descriptor.kind_name,
                path = %event.path,
                "ignoring unrecognized export path"
            );
        }
    }

    fn apply(&mut self, target: &FieldTarget, event: &DecodedEvent) {
        let text = event.text_or_empty().to_string();
        let object = &mut self.object;
        match target {
            FieldTarget::Name => object.admin_mut().name = text,
            FieldTarget::Description => object.admin_mut().description = text,
            // Presence alone marks the object hidden.
            FieldTarget::Hidden => object.admin_mut().hidden = true,
            FieldTarget::Field(name) => {
                object.admin_mut().fields.insert(name.clone(), text);
            }
            FieldTarget::Revision
            | FieldTarget::Vault
            | FieldTarget::ObjectId
            | FieldTarget::BusinessType => {
                let SyncObject::Business(business) = object else {
                    tracing::debug!(path = %event.path, "business field on an admin kind");
                    return;
                };
                let value = Some(text).filter(|t| !t.is_empty());
                match target {
                    FieldTarget::Revision => business.revision = value,
                    FieldTarget::Vault => business.vault = value,
                    FieldTarget::ObjectId => business.object_id = value,
                    _ => business.business_type = value.unwrap_or_default(),
                }
            }
        }
    }

    /// Finishes the object, resolving housekeeping properties.
    pub fn finish(self) -> SyncObject {
        let mut object = self.object;
        if let Some(properties) = self.properties {
            let properties = properties.finish();
            let admin = object.admin_mut();
            admin.author = properties.value_of("author").unwrap_or_default().to_string();
            admin.version = properties.value_of("version").map(str::to_string);
            admin.installation = installation(&properties);
            admin.properties = properties;
        }
        if let (Some(attributes), SyncObject::Business(business)) = (self.attributes, &mut object) {
            business.attributes = attributes.finish();
        }
        object
    }
}

fn installation(properties: &PropertyMap) -> Installation {
    let value = |name: &str| properties.value_of(name).map(str::to_string);
    Installation {
        installed_date: value("installed date"),
        original_name: value("original name"),
        application: value("application"),
        installer: value("installer"),
    }
}

/// Decodes an object from a streamed export document.
///
/// # Errors
///
/// Returns an error if the document cannot be read or is malformed.
pub fn decode_object<R: BufRead>(
    descriptor: &KindDescriptor,
    input: R,
    config: &DecodeConfig,
) -> DecodeResult<SyncObject> {
    let mut builder = ObjectBuilder::new(descriptor);
    for event in events(input, config) {
        builder.accept(&event?);
    }
    Ok(builder.finish())
}

/// Decodes an object from an export document held in memory.
///
/// # Errors
///
/// Returns an error if the document is malformed.
pub fn decode_object_str(descriptor: &KindDescriptor, document: &str) -> DecodeResult<SyncObject> {
    decode_object(descriptor, document.as_bytes(), &DecodeConfig::default())
}
