//! Sync script assembly.
//!
//! A sync script has a fixed layout:
//!
//! ```text
//! <reset block>          one statement per field that currently holds a value
//! <pre-script>
//! tcl;
//! eval {
//! set NAME "value"       one per variable
//! <body>
//! }
//! exit;
//! <post-script>          stamps the version property
//! ```

use crate::change::LocalMarker;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use admsync_model::{KindDescriptor, ObjectAddress, SyncObject};
use std::collections::BTreeMap;

/// What to apply to one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Statements run before script mode is entered.
    pub pre_script: String,
    /// Script body run in script mode.
    pub body: String,
    /// Variables made available to the body.
    pub variables: BTreeMap<String, String>,
    /// Version stamped on the object after the body.
    pub stamp: LocalMarker,
}

impl UpdateRequest {
    /// Creates a request stamped with the current time.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            pre_script: String::new(),
            body: body.into(),
            variables: BTreeMap::new(),
            stamp: LocalMarker::now(),
        }
    }

    /// Sets the pre-script.
    pub fn with_pre_script(mut self, pre_script: impl Into<String>) -> Self {
        self.pre_script = pre_script.into();
        self
    }

    /// Adds a variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Sets the version stamp.
    pub fn with_stamp(mut self, stamp: LocalMarker) -> Self {
        self.stamp = stamp;
        self
    }

    fn validate(&self) -> SyncResult<()> {
        for name in self.variables.keys() {
            let valid = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(SyncError::InvalidRequest(format!(
                    "invalid variable name '{name}'"
                )));
            }
        }
        Ok(())
    }
}

/// A generated sync script and what it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Object kind.
    pub kind: String,
    /// Object name.
    pub name: String,
    /// Address used by the statements.
    pub address: String,
    /// Number of reset statements.
    pub reset_statements: usize,
    /// Full script text.
    pub script: String,
    /// Version stamped by the post-script.
    pub stamp: LocalMarker,
}

/// Quotes a statement argument.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Escapes a value for a double-quoted script-mode word.
pub fn escape_script_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '[' | ']' | '{' | '}') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the statements that clear every field `object` currently holds.
///
/// Housekeeping properties and fields the kind ignores on reset are left
/// alone; a blank object yields no statements.
pub fn reset_block(
    descriptor: &KindDescriptor,
    object: &SyncObject,
    address: &ObjectAddress,
) -> Vec<String> {
    let admin = object.admin();
    let mut clauses = Vec::new();

    if !admin.description.is_empty() {
        clauses.push(format!("description {}", quote("")));
    }
    if admin.hidden {
        clauses.push("!hidden".to_string());
    }
    for property in admin.properties.output_visible() {
        let mut clause = format!("remove property {}", quote(&property.name));
        if property.is_reference() {
            clause.push_str(&format!(
                " to {} {}",
                property.referenced_kind.as_deref().unwrap_or(""),
                quote(property.referenced_name.as_deref().unwrap_or(""))
            ));
        }
        clauses.push(clause);
    }
    for (field, value) in &admin.fields {
        if !value.is_empty() && !descriptor.is_ignored_on_reset(field) {
            clauses.push(format!("{field} {}", quote("")));
        }
    }
    if let Some(business) = object.business() {
        for attribute in &business.attributes {
            if !attribute.value.is_empty() && !descriptor.is_ignored_on_reset(&attribute.name) {
                clauses.push(format!("{} {}", quote(&attribute.name), quote("")));
            }
        }
    }

    clauses
        .into_iter()
        .map(|clause| format!("escape mod {address} {clause};"))
        .collect()
}

/// Assembles sync scripts for one configuration.
#[derive(Debug, Clone)]
pub struct ScriptBuilder<'a> {
    config: &'a SyncConfig,
}

impl<'a> ScriptBuilder<'a> {
    /// Creates a builder.
    pub fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    /// Statement stamping the version property.
    pub fn post_script(&self, address: &ObjectAddress, stamp: LocalMarker) -> String {
        format!(
            "escape mod {address} property {} value {};",
            quote(&self.config.version_property),
            quote(&stamp.to_string())
        )
    }

    /// Assembles the full script.
    pub fn build(
        &self,
        reset: &[String],
        request: &UpdateRequest,
        address: &ObjectAddress,
    ) -> String {
        let mut lines: Vec<String> = reset.to_vec();
        if !request.pre_script.is_empty() {
            lines.push(request.pre_script.clone());
        }
        lines.push(self.config.mode_switch.clone());
        lines.push(self.config.block_open.clone());
        for (name, value) in &request.variables {
            lines.push(format!("set {name} \"{}\"", escape_script_value(value)));
        }
        if !request.body.is_empty() {
            lines.push(request.body.trim_end().to_string());
        }
        lines.push(self.config.block_close.clone());
        lines.push(self.config.mode_exit.clone());
        lines.push(self.post_script(address, request.stamp));

        let mut script = lines.join("\n");
        script.push('\n');
        script
    }

    /// Plans the sync of `object` without touching a remote store.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRequest`] if a variable name is unusable.
    pub fn plan(
        &self,
        descriptor: &KindDescriptor,
        object: &SyncObject,
        request: &UpdateRequest,
    ) -> SyncResult<SyncReport> {
        request.validate()?;
        let address = object.address(descriptor);
        let reset = reset_block(descriptor, object, &address);
        let script = self.build(&reset, request, &address);
        Ok(SyncReport {
            kind: descriptor.kind_name.clone(),
            name: object.name(),
            address: address.to_string(),
            reset_statements: reset.len(),
            script,
            stamp: request.stamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admsync_model::{AttributeValue, FileNaming, Property};

    fn attribute() -> KindDescriptor {
        KindDescriptor::admin("attribute", FileNaming::new("ATTRIBUTE_", ".tcl"))
            .with_field("/primitiveType", "type")
            .with_field("/defaultValue", "default")
            .ignore_on_reset("type")
    }

    fn weight() -> SyncObject {
        let descriptor = attribute();
        let mut object = SyncObject::empty(&descriptor);
        let admin = object.admin_mut();
        admin.name = "Weight".into();
        admin.description = "Net weight".into();
        admin.hidden = true;
        admin.author = "Jane".into();
        admin.fields.insert("type".into(), "real".into());
        admin.fields.insert("default".into(), "0.0".into());
        admin.properties.insert(Property::new("author", "Jane"));
        admin.properties.insert(Property::new("version", "1"));
        admin.properties.insert(Property::new("X", "1"));
        admin
            .properties
            .insert(Property::new("P", "").with_reference("type", "Part"));
        object
    }

    #[test]
    fn quoting() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
        assert_eq!(escape_script_value("$a [b] {c} \"d\" \\"), r#"\$a \[b\] \{c\} \"d\" \\"#);
    }

    #[test]
    fn reset_clears_set_fields_only() {
        let descriptor = attribute();
        let object = weight();
        let address = object.address(&descriptor);
        let reset = reset_block(&descriptor, &object, &address);

        assert_eq!(
            reset,
            vec![
                "escape mod attribute 'Weight' description \"\";",
                "escape mod attribute 'Weight' !hidden;",
                "escape mod attribute 'Weight' remove property \"P\" to type \"Part\";",
                "escape mod attribute 'Weight' remove property \"X\";",
                "escape mod attribute 'Weight' default \"\";",
            ]
        );
        assert!(!reset.iter().any(|s| s.contains("author")));
    }

    #[test]
    fn blank_object_has_empty_reset() {
        let descriptor = attribute();
        let mut object = SyncObject::empty(&descriptor);
        object.admin_mut().name = "New".into();
        let address = object.address(&descriptor);
        assert!(reset_block(&descriptor, &object, &address).is_empty());
    }

    #[test]
    fn business_attributes_are_reset() {
        let descriptor = KindDescriptor::business("Trigger", FileNaming::default());
        let mut object = SyncObject::empty(&descriptor);
        if let SyncObject::Business(business) = &mut object {
            business.admin.name = "Check".into();
            business.revision = Some("1".into());
            business.object_id = Some("1.2.3.4".into());
            business.attributes.insert(AttributeValue::new("Line 1", "a"));
            business.attributes.insert(AttributeValue::new("Line 2", ""));
        }
        let address = object.address(&descriptor);
        assert_eq!(
            reset_block(&descriptor, &object, &address),
            vec!["escape mod bus 1.2.3.4 \"Line 1\" \"\";"]
        );
    }

    #[test]
    fn script_layout() {
        let config = SyncConfig::default();
        let descriptor = attribute();
        let mut object = SyncObject::empty(&descriptor);
        object.admin_mut().name = "Weight".into();
        object.admin_mut().description = "old".into();

        let request = UpdateRequest::new("mql mod attribute $NAME description \"new\";\n")
            .with_pre_script("verbose on;")
            .with_variable("NAME", "Weight")
            .with_variable("PRICE", "$5")
            .with_stamp(LocalMarker::from_epoch_seconds(1_700_000_000));
        let report = ScriptBuilder::new(&config)
            .plan(&descriptor, &object, &request)
            .unwrap();

        assert_eq!(report.kind, "attribute");
        assert_eq!(report.name, "Weight");
        assert_eq!(report.reset_statements, 1);
        assert_eq!(
            report.script,
            "escape mod attribute 'Weight' description \"\";\n\
             verbose on;\n\
             tcl;\n\
             eval {\n\
             set NAME \"Weight\"\n\
             set PRICE \"\\$5\"\n\
             mql mod attribute $NAME description \"new\";\n\
             }\n\
             exit;\n\
             escape mod attribute 'Weight' property \"version\" value \"1700000000\";\n"
        );
    }

    #[test]
    fn stamp_uses_configured_property() {
        let config = SyncConfig::new().with_version_property("file date");
        let address = ObjectAddress::Named {
            kind: "type".into(),
            name: "Part".into(),
            suffix: None,
        };
        assert_eq!(
            ScriptBuilder::new(&config).post_script(&address, LocalMarker::from_epoch_seconds(7)),
            "escape mod type 'Part' property \"file date\" value \"7\";"
        );
    }

    #[test]
    fn invalid_variable_names_are_rejected() {
        let config = SyncConfig::default();
        let descriptor = attribute();
        let object = SyncObject::empty(&descriptor);
        for name in ["", "two words", "a$b"] {
            let request = UpdateRequest::new("").with_variable(name, "x");
            assert!(matches!(
                ScriptBuilder::new(&config).plan(&descriptor, &object, &request),
                Err(SyncError::InvalidRequest(_))
            ));
        }
    }
}
