//! # Error Taxonomy
//!
//! Request-level failures of the validator, built with `thiserror`.
//!
//! Row-level and resource-level data problems never appear here: they are
//! folded into a [`ValidationResult`](crate::ValidationResult). Only failures
//! that indicate a malformed request or a missing setup step propagate to the
//! caller as a `ValidatorError`.

use thiserror::Error;

/// Closed set of request-level failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    /// A required input (data source, resource name, schema) is absent.
    #[error("{0}")]
    Precondition(String),

    /// The requested resource name is not declared by the package.
    #[error("{0}")]
    NotFound(String),

    /// The operation was invoked before its required setup, e.g. validating
    /// a package before one has been loaded.
    #[error("{0}")]
    State(String),

    /// The package descriptor could not be fetched, parsed, or checked.
    #[error("failed to load data package from '{location}': {reason}")]
    Load {
        /// Path or URL the descriptor was requested from.
        location: String,
        /// Why loading failed.
        reason: String,
    },
}

impl ValidatorError {
    /// Shorthand for a [`ValidatorError::Load`].
    pub fn load(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Whether this failure describes missing or unknown request input, as
    /// opposed to a setup or loading problem.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_) | Self::NotFound(_))
    }
}
