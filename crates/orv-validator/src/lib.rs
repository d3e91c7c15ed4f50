//! # orv-validator — Validation Core
//!
//! Composes the schema registry, resource locator and tabular capability
//! into the two public validation operations.
//!
//! ```text
//! Validator ──► DataPackage (schema) ──► ResourceLocator (exists?)
//!     │                                        │
//!     ▼                                        ▼
//! RowScanner ── ScanEvent ──► resolve() ──► ValidationResult
//! ```
//!
//! - [`scanner`]: forward-only iteration producing [`ScanEvent`]s.
//! - [`resolver`]: turns every failure shape into [`ValidationError`]s.
//! - [`orchestrator`]: [`Validator::validate_resource`] and
//!   [`Validator::validate_package`].
//!
//! Each validation owns its scanner and error list; the only shared state is
//! the read-only package handle.
//!
//! [`ValidationError`]: orv_core::ValidationError

pub mod orchestrator;
pub mod resolver;
pub mod scanner;

pub use orchestrator::{PackageOptions, ResourceOptions, Validator};
pub use resolver::{resolve, Failure};
pub use scanner::{RowScanner, ScanEvent, ScanOptions};
