//! # Table Schema Descriptors
//!
//! Explicit records for the declarative table-schema documents embedded in
//! a data package: ordered field definitions, primary key, and foreign keys.
//!
//! ## Key Tags
//!
//! [`SchemaDescriptor::with_key_tags`] produces a derived view in which each
//! field that participates in the primary key or a foreign key carries a
//! [`FieldKeys`] tag. The view is computed on read and never written back to
//! the loaded descriptor. Only the first field of each key declaration is
//! tagged, and key declarations naming unknown fields are skipped silently.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field names of a key declaration, written either as a single name or as
/// a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum KeyFields {
    Single(String),
    Many(Vec<String>),
}

impl KeyFields {
    /// All field names, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// The first field name, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(name) => Some(name.as_str()),
            Self::Many(names) => names.first().map(String::as_str),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Logical type of a table field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Date,
    Time,
    Datetime,
    Year,
    Yearmonth,
    Duration,
    Geopoint,
    Geojson,
    Any,
}

impl FieldType {
    /// The descriptor spelling of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Date => "date",
            Self::Time => "time",
            Self::Datetime => "datetime",
            Self::Year => "year",
            Self::Yearmonth => "yearmonth",
            Self::Duration => "duration",
            Self::Geopoint => "geopoint",
            Self::Geojson => "geojson",
            Self::Any => "any",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value constraints declared on a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    /// Allowed values. Compared against the cast value, or against the raw
    /// cell text for string entries.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Vec<Object>>))]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub minimum: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub maximum: Option<Value>,
    /// Regular expression the whole cell text must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// A foreign-key target as shown in a key tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ForeignKeyTag {
    pub resource: String,
    pub field: String,
}

/// Derived key participation of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldKeys {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign: Vec<ForeignKeyTag>,
}

/// A single column declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    /// Present only in the key-tagged view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<FieldKeys>,
}

impl FieldDefinition {
    /// A bare field of the given type with default format and no constraints.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            format: None,
            title: None,
            description: None,
            constraints: None,
            keys: None,
        }
    }

    /// Builder-style constraint attachment.
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Builder-style format attachment.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// The declared format, or `"default"`.
    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or("default")
    }

    pub fn is_required(&self) -> bool {
        self.constraints
            .as_ref()
            .and_then(|c| c.required)
            .unwrap_or(false)
    }

    pub fn is_unique(&self) -> bool {
        self.constraints
            .as_ref()
            .and_then(|c| c.unique)
            .unwrap_or(false)
    }
}

/// Target side of a foreign key. An empty `resource` refers to the
/// declaring resource itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ForeignKeyReference {
    #[serde(default)]
    pub resource: String,
    pub fields: KeyFields,
}

/// A foreign-key declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ForeignKey {
    pub fields: KeyFields,
    pub reference: ForeignKeyReference,
}

fn default_missing_values() -> Vec<String> {
    vec![String::new()]
}

/// An ordered table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescriptor {
    pub fields: Vec<FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<KeyFields>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
    /// Cell values that are read as null.
    #[serde(default = "default_missing_values")]
    pub missing_values: Vec<String>,
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            missing_values: default_missing_values(),
        }
    }
}

impl SchemaDescriptor {
    /// A schema with the given fields and no keys.
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Zero-based position of a field.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Check the structural rules that typed deserialization cannot express:
    /// non-empty, unique field names and balanced foreign-key field lists.
    pub fn check_shape(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err("schema declares a field with an empty name".to_string());
            }
            if !seen.insert(field.name.as_str()) {
                return Err(format!("schema declares field '{}' more than once", field.name));
            }
        }
        for fk in &self.foreign_keys {
            if fk.fields.len() != fk.reference.fields.len() {
                return Err(format!(
                    "foreign key {:?} declares {} local fields but {} reference fields",
                    fk.fields.names(),
                    fk.fields.len(),
                    fk.reference.fields.len()
                ));
            }
        }
        Ok(())
    }

    /// Derived view with primary/foreign key tags attached to fields.
    pub fn with_key_tags(&self) -> SchemaDescriptor {
        let mut tagged = self.clone();

        if let Some(pk) = self.primary_key.as_ref().and_then(KeyFields::first) {
            if let Some(field) = tagged.fields.iter_mut().find(|f| f.name == pk) {
                field.keys.get_or_insert_with(FieldKeys::default).primary = true;
            }
        }

        for fk in &self.foreign_keys {
            let Some(local) = fk.fields.first() else {
                continue;
            };
            if let Some(field) = tagged.fields.iter_mut().find(|f| f.name == local) {
                field
                    .keys
                    .get_or_insert_with(FieldKeys::default)
                    .foreign
                    .push(ForeignKeyTag {
                        resource: fk.reference.resource.clone(),
                        field: fk.reference.fields.first().unwrap_or_default().to_string(),
                    });
            }
        }

        tagged
    }
}
