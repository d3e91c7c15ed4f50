//! # Resource Definitions
//!
//! The registry's view of one named resource of a data package.

use serde::{Deserialize, Serialize};

use crate::schema::SchemaDescriptor;

/// Where the data of a resource lives: a single path/URL, or several parts
/// read back to back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum SourceLocator {
    Path(String),
    Parts(Vec<String>),
}

impl SourceLocator {
    /// All parts, in read order.
    pub fn parts(&self) -> Vec<&str> {
        match self {
            Self::Path(path) => vec![path.as_str()],
            Self::Parts(parts) => parts.iter().map(String::as_str).collect(),
        }
    }
}

impl std::fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.parts().join(", "))
    }
}

/// A resource declared by the loaded package.
///
/// `source` is `None` for resources whose data is inline in the descriptor.
/// `schema` is attached only when the caller asked for full detail, and is
/// then the key-tagged view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResourceDefinition {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocator>,
    pub local: bool,
    pub remote: bool,
    pub multipart: bool,
    pub tabular: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaDescriptor>,
}

impl ResourceDefinition {
    pub fn summary(&self) -> ResourceSummary {
        ResourceSummary {
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            source: self.source.clone(),
        }
    }
}

/// Listing entry for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResourceSummary {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocator>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_locator_is_string_or_list() {
        let single: SourceLocator = serde_json::from_str("\"data/program.csv\"").unwrap();
        assert_eq!(single.parts(), vec!["data/program.csv"]);

        let parts: SourceLocator = serde_json::from_str("[\"a.csv\", \"b.csv\"]").unwrap();
        assert_eq!(parts.parts().len(), 2);
        assert_eq!(parts.to_string(), "a.csv, b.csv");
    }

    #[test]
    fn definition_without_schema_omits_it() {
        let def = ResourceDefinition {
            name: "program".into(),
            title: "Program".into(),
            description: None,
            source: Some(SourceLocator::Path("program.csv".into())),
            local: true,
            remote: false,
            multipart: false,
            tabular: true,
            schema: None,
        };
        let json = serde_json::to_value(&def).unwrap();
        assert!(json.get("schema").is_none());
        assert!(json.get("description").is_none());
        assert_eq!(json["source"], "program.csv");

        let summary = def.summary();
        assert_eq!(summary.name, "program");
        assert_eq!(summary.title, "Program");
    }
}
