//! Serde shapes of a data package descriptor.
//!
//! Only the properties the validator uses are modelled; everything else in
//! the descriptor is ignored after the profile check.

use orv_core::{SchemaDescriptor, SourceLocator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub resources: Vec<ResourceDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<SourceLocator>,
    /// Inline rows: an array of arrays, or an array of objects keyed by
    /// field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<Dialect>,
}

impl ResourceDescriptor {
    /// Whether the resource is tabular data.
    pub fn is_tabular(&self) -> bool {
        self.schema.is_some()
            || self.profile.as_deref() == Some("tabular-data-resource")
            || self
                .format
                .as_deref()
                .is_some_and(|f| f.eq_ignore_ascii_case("csv"))
            || self
                .path
                .as_ref()
                .is_some_and(|p| p.parts().iter().all(|part| part.to_ascii_lowercase().ends_with(".csv")))
    }

    /// Whether the first physical row holds headers.
    pub fn has_header(&self) -> bool {
        self.dialect.as_ref().map_or(true, |d| d.header)
    }
}

/// A resource schema, inline or by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaRef {
    Inline(SchemaDescriptor),
    /// Path or URL of a table schema document, relative to the descriptor.
    Reference(String),
}

fn yes() -> bool {
    true
}

/// CSV dialect hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    #[serde(default = "yes")]
    pub header: bool,
}
