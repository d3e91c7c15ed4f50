//! # Validation Reports
//!
//! The records returned to callers of the validator. Both types are created
//! fresh per validation call.

use serde::{Deserialize, Serialize};

/// One reported problem.
///
/// `row` and `col` are 1-based and absent for problems that are not scoped
/// to a cell, such as an unavailable resource. A header mismatch carries the
/// header row's position but no column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<u64>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ValidationError {
    /// An error with no location.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            row: None,
            col: None,
            description: description.into(),
            details: None,
        }
    }

    /// An error at the given row and, optionally, column.
    pub fn at(row: Option<u64>, col: Option<u64>, description: impl Into<String>) -> Self {
        Self {
            row,
            col,
            description: description.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(row) = self.row {
            write!(f, "Row: {row}, ")?;
        }
        if let Some(col) = self.col {
            write!(f, "Col: {col}, ")?;
        }
        f.write_str(&self.description)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

/// Outcome of validating one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidationResult {
    /// Set only for whole-package validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Build a result whose validity follows from the error list.
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            resource: None,
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Tag the result with a resource name.
    pub fn for_resource(mut self, name: impl Into<String>) -> Self {
        self.resource = Some(name.into());
        self
    }
}
