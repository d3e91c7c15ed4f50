//! # Error Resolver
//!
//! Normalizes every failure shape into [`ValidationError`]s. Pure and
//! total: a failure it cannot classify resolves to nothing and is logged.
//!
//! Classification, in priority order:
//!
//! 1. a multi-cause cast failure yields one error per sub-failure;
//! 2. any other failure carrying a row, column or message yields one error;
//! 3. a precondition failure yields one error without location;
//! 4. anything else yields no error.
//!
//! Afterwards, a header-mismatch error gets `details` listing the expected
//! field names in order.

use orv_core::{SchemaDescriptor, ValidationError, ValidatorError};
use orv_table::error::HEADER_MISMATCH;
use orv_table::TableSchemaError;
use thiserror::Error;

/// A failure met while validating one resource.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Failure {
    /// Row-level failure from the tabular capability.
    #[error("{0}")]
    Cast(TableSchemaError),
    /// The source stopped being readable.
    #[error("{message}")]
    Fatal { message: String },
    /// A request-level failure raised while preparing the scan.
    #[error("{0}")]
    Request(ValidatorError),
}

/// Resolve `failure` for a resource with `schema`.
pub fn resolve(schema: Option<&SchemaDescriptor>, failure: Failure) -> Vec<ValidationError> {
    let mut errors = classify(failure);
    if let Some(schema) = schema {
        for error in &mut errors {
            if error.description == HEADER_MISMATCH {
                error.details = Some(expected_fields(schema));
            }
        }
    }
    errors
}

/// Whether `errors` report a header mismatch, after which scanning a
/// resource any further only repeats the same problem.
pub fn is_headers_mismatch(errors: &[ValidationError]) -> bool {
    errors.iter().any(|e| e.description == HEADER_MISMATCH)
}

fn classify(failure: Failure) -> Vec<ValidationError> {
    match failure {
        Failure::Cast(err) if !err.errors.is_empty() => err
            .errors
            .into_iter()
            .map(|sub| ValidationError::at(sub.row_number, sub.column_number, sub.message))
            .collect(),
        Failure::Cast(err) if !err.message.is_empty() || err.row_number.is_some() => {
            vec![ValidationError::at(err.row_number, err.column_number, err.message)]
        }
        Failure::Fatal { message } if !message.is_empty() => vec![ValidationError::new(message)],
        Failure::Request(err) if err.is_precondition() => vec![ValidationError::new(err.to_string())],
        other => {
            tracing::warn!(failure = ?other, "dropping unclassified validation failure");
            Vec::new()
        }
    }
}

fn expected_fields(schema: &SchemaDescriptor) -> String {
    format!(
        "Expected fields (in order): {}",
        schema.field_names().join(", ")
    )
}
