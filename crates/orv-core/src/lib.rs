//! # orv-core — Shared Types for the Open Referral Validator
//!
//! The leaf crate of the workspace. It defines the record types every other
//! crate exchanges and the closed error taxonomy the validator surfaces to
//! its callers.
//!
//! ## Contents
//!
//! - [`schema`]: explicit table-schema records (`SchemaDescriptor`,
//!   `FieldDefinition`, key declarations) and the derived key-tag view.
//! - [`resource`]: `ResourceDefinition` and `ResourceSummary` as exposed by
//!   the schema registry.
//! - [`report`]: `ValidationError` and `ValidationResult`, the wire shape of
//!   every validation response.
//! - [`error`]: `ValidatorError`, the request-level failures that propagate
//!   to callers instead of being folded into a report.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `orv-*` crates.
//! - Descriptor shapes are checked once at package-load time; downstream code
//!   works with typed records, never with raw JSON object graphs.
//! - No `.unwrap()` outside tests.

pub mod error;
pub mod report;
pub mod resource;
pub mod schema;

pub use error::ValidatorError;
pub use report::{ValidationError, ValidationResult};
pub use resource::{ResourceDefinition, ResourceSummary, SourceLocator};
pub use schema::{
    Constraints, FieldDefinition, FieldKeys, FieldType, ForeignKey, ForeignKeyReference,
    ForeignKeyTag, KeyFields, SchemaDescriptor,
};
