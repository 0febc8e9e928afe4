//! Benchmark utilities.

use admsync_model::{FileNaming, KindDescriptor};

/// Attribute kind used by the benchmarks.
pub fn attribute_kind() -> KindDescriptor {
    KindDescriptor::admin("attribute", FileNaming::new("ATTRIBUTE_", ".tcl"))
        .with_field("/primitiveType", "type")
        .with_field("/defaultValue", "default")
        .ignore_on_reset("type")
}

/// Generate an attribute export carrying `properties` properties.
///
/// Every fourth property is a reference to a type.
pub fn attribute_export(name: &str, properties: usize) -> String {
    let mut doc = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE ematrix SYSTEM \"ematrix.dtd\">\n\
         <ematrix>\n  <creationProperties><release>bench</release></creationProperties>\n  <attributeDef>\n    <adminProperties>\n",
    );
    doc.push_str(&format!("      <name>{name}</name>\n"));
    doc.push_str("      <description>Generated &amp; benchmarked</description>\n");
    doc.push_str("      <propertyList>\n");
    for i in 0..properties {
        doc.push_str("        <property>");
        doc.push_str(&format!("<name>Property{i}</name><value>value {i}</value>"));
        if i % 4 == 0 {
            doc.push_str(&format!(
                "<adminRef><adminType>type</adminType><adminName>Part{i}</adminName></adminRef>"
            ));
        }
        doc.push_str("</property>\n");
    }
    doc.push_str("      </propertyList>\n    </adminProperties>\n");
    doc.push_str("    <primitiveType>string</primitiveType>\n");
    doc.push_str("    <defaultValue>none</defaultValue>\n");
    doc.push_str("  </attributeDef>\n</ematrix>\n");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use admsync_model::decode_object_str;

    #[test]
    fn generated_export_decodes() {
        let object = decode_object_str(&attribute_kind(), &attribute_export("Weight", 8)).unwrap();
        assert_eq!(object.name(), "Weight");
        assert_eq!(object.admin().properties.len(), 8);
        assert_eq!(object.admin().description, "Generated & benchmarked");
    }
}
