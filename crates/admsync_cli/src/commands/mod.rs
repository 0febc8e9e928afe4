//! CLI command implementations.

pub mod check;
pub mod decode;
pub mod plan;

use crate::KindArgs;
use admsync_model::{FileNaming, KindDescriptor};

impl KindArgs {
    /// Builds the kind descriptor described by the options.
    pub fn descriptor(&self) -> Result<KindDescriptor, Box<dyn std::error::Error>> {
        let naming = FileNaming::new(format!("{}_", self.kind.to_uppercase()), ".tcl");
        let mut descriptor = match &self.business {
            Some(business_type) => KindDescriptor::business(business_type, naming),
            None => KindDescriptor::admin(&self.kind, naming),
        };
        if let Some(suffix) = &self.suffix {
            descriptor = descriptor.with_address_suffix(suffix);
        }
        for binding in &self.fields {
            let (path, name) = split_pair(binding, "--field")?;
            descriptor = descriptor.with_field(path, name);
        }
        for field in &self.keep {
            descriptor = descriptor.ignore_on_reset(field);
        }
        Ok(descriptor)
    }
}

/// Splits a `KEY=VALUE` argument.
pub fn split_pair<'a>(
    argument: &'a str,
    option: &str,
) -> Result<(&'a str, &'a str), Box<dyn std::error::Error>> {
    argument
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("{option} expects KEY=VALUE, got '{argument}'").into())
}
