//! Plan command implementation.

use super::decode::decode_file;
use super::split_pair;
use admsync_engine::{LocalMarker, ScriptBuilder, SyncConfig, SyncReport, UpdateRequest};
use admsync_model::{KindDescriptor, SyncObject};
use std::path::PathBuf;

/// Options of the plan command.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Script body file.
    pub body: PathBuf,
    /// Current export of the object.
    pub export: Option<PathBuf>,
    /// Object name when no export is given.
    pub name: Option<String>,
    /// Pre-script file.
    pub pre: Option<PathBuf>,
    /// Variables as NAME=VALUE.
    pub vars: Vec<String>,
    /// Explicit version stamp.
    pub stamp: Option<i64>,
}

/// Builds the report a sync of the described object would produce.
pub fn plan(
    descriptor: &KindDescriptor,
    options: &PlanOptions,
) -> Result<SyncReport, Box<dyn std::error::Error>> {
    let object = match (&options.export, &options.name) {
        (Some(export), _) => decode_file(export, descriptor)?,
        (None, Some(name)) => SyncObject::placeholder(descriptor, name),
        (None, None) => {
            let file_name = options
                .body
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            let name = descriptor
                .file_naming
                .object_name(file_name)
                .ok_or("either --export or --name is required")?;
            SyncObject::placeholder(descriptor, name)
        }
    };

    let body = std::fs::read_to_string(&options.body)
        .map_err(|e| format!("cannot read {}: {e}", options.body.display()))?;
    let stamp = match options.stamp {
        Some(seconds) => LocalMarker::from_epoch_seconds(seconds),
        None => LocalMarker::from_path(&options.body)?,
    };

    let mut request = UpdateRequest::new(body).with_stamp(stamp);
    if let Some(pre) = &options.pre {
        request = request.with_pre_script(std::fs::read_to_string(pre)?);
    }
    for pair in &options.vars {
        let (name, value) = split_pair(pair, "--var")?;
        request = request.with_variable(name, value);
    }

    let config = SyncConfig::default();
    Ok(ScriptBuilder::new(&config).plan(descriptor, &object, &request)?)
}

/// Runs the plan command.
pub fn run(
    descriptor: &KindDescriptor,
    options: &PlanOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = plan(descriptor, options)?;
    tracing::info!(
        kind = %report.kind,
        name = %report.name,
        reset = report.reset_statements,
        stamp = %report.stamp,
        "planned sync"
    );
    print!("{}", report.script);
    Ok(())
}
