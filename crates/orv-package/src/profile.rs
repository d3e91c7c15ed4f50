//! Data Package profile check.
//!
//! Raw descriptors are validated against the bundled JSON Schema (draft 7)
//! before they are deserialized, so that a malformed descriptor fails at
//! load time with every violation listed.

use serde_json::Value;

const DATA_PACKAGE_PROFILE: &str = include_str!("../assets/data-package.profile.json");

/// One profile violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileViolation {
    /// JSON Pointer to the offending part of the descriptor.
    pub instance_path: String,
    pub message: String,
}

impl std::fmt::Display for ProfileViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.instance_path.is_empty() {
            "/"
        } else {
            &self.instance_path
        };
        write!(f, "{path}: {}", self.message)
    }
}

/// Validate `descriptor` against the Data Package profile. The outer error
/// means the profile itself could not be compiled.
pub fn check(descriptor: &Value) -> Result<Vec<ProfileViolation>, String> {
    let schema: Value = serde_json::from_str(DATA_PACKAGE_PROFILE)
        .map_err(|e| format!("bundled profile is not valid JSON: {e}"))?;
    let validator = jsonschema::options()
        .with_draft(jsonschema::Draft::Draft7)
        .build(&schema)
        .map_err(|e| format!("bundled profile does not compile: {e}"))?;

    Ok(validator
        .iter_errors(descriptor)
        .map(|err| ProfileViolation {
            instance_path: err.instance_path.to_string(),
            message: err.to_string(),
        })
        .collect())
}
