//! Decode command implementation.

use admsync_decode::DecodeConfig;
use admsync_model::{decode_object, KindDescriptor, SyncObject};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Decodes the export document at `path`.
pub fn decode_file(
    path: &Path,
    descriptor: &KindDescriptor,
) -> Result<SyncObject, Box<dyn std::error::Error>> {
    let file = File::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    let object = decode_object(descriptor, BufReader::new(file), &DecodeConfig::default())?;
    Ok(object)
}

/// Runs the decode command.
pub fn run(
    path: &Path,
    descriptor: &KindDescriptor,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let object = decode_file(path, descriptor)?;
    tracing::debug!(path = %path.display(), name = %object.name(), "decoded export");

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&object)?),
        "text" => print!("{}", render_text(&object)),
        other => return Err(format!("unknown format '{other}'").into()),
    }
    Ok(())
}

fn render_text(object: &SyncObject) -> String {
    let admin = object.admin();
    let mut out = String::new();
    out.push_str(&format!("Name:        {}\n", object.name()));
    out.push_str(&format!("Description: {}\n", admin.description));
    out.push_str(&format!("Hidden:      {}\n", admin.hidden));
    if !admin.author.is_empty() {
        out.push_str(&format!("Author:      {}\n", admin.author));
    }
    if let Some(version) = &admin.version {
        out.push_str(&format!("Version:     {version}\n"));
    }
    if let Some(business) = object.business() {
        if let Some(id) = &business.object_id {
            out.push_str(&format!("Object id:   {id}\n"));
        }
        if let Some(vault) = &business.vault {
            out.push_str(&format!("Vault:       {vault}\n"));
        }
    }

    if !admin.fields.is_empty() {
        out.push_str("\nFields:\n");
        for (name, value) in &admin.fields {
            out.push_str(&format!("  {name} = {value}\n"));
        }
    }

    if !admin.properties.is_empty() {
        out.push_str("\nProperties:\n");
        for (key, property) in admin.properties.iter() {
            let value = property.value.as_deref().unwrap_or("");
            out.push_str(&format!("  {key} = {value}\n"));
        }
    }

    if let Some(business) = object.business() {
        if !business.attributes.is_empty() {
            out.push_str("\nAttributes:\n");
            for attribute in &business.attributes {
                out.push_str(&format!("  {} = {}\n", attribute.name, attribute.value));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use admsync_model::FileNaming;

    const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ematrix>
  <creationProperties><release>2024x</release></creationProperties>
  <attributeDef>
    <adminProperties>
      <name>Weight</name>
      <description>Net weight</description>
      <propertyList>
        <property><name>author</name><value>Jane</value></property>
        <property><name>X</name><value>1</value></property>
      </propertyList>
    </adminProperties>
    <primitiveType>real</primitiveType>
  </attributeDef>
</ematrix>
"#;

    fn attribute() -> KindDescriptor {
        KindDescriptor::admin("attribute", FileNaming::new("ATTRIBUTE_", ".tcl"))
            .with_field("/primitiveType", "type")
    }

    #[test]
    fn decode_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Weight.xml");
        std::fs::write(&path, EXPORT).unwrap();

        let object = decode_file(&path, &attribute()).unwrap();
        assert_eq!(object.name(), "Weight");
        assert_eq!(object.admin().author, "Jane");

        let text = render_text(&object);
        assert!(text.contains("Description: Net weight"));
        assert!(text.contains("  type = real"));
        assert!(text.contains("  X = 1"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(decode_file(&dir.path().join("absent.xml"), &attribute()).is_err());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Weight.xml");
        std::fs::write(&path, EXPORT).unwrap();
        assert!(run(&path, &attribute(), "yaml").is_err());
    }
}
