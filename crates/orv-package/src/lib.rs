//! # orv-package — Schema Registry and Resource Locator
//!
//! Loads data package descriptors and answers questions about the resources
//! they declare.
//!
//! - [`DataPackage`] is the schema registry: it loads a descriptor from a
//!   path or URL (JSON or YAML), checks it against the bundled Data Package
//!   profile, resolves schema references and resource paths, and indexes the
//!   resources by name. [`DataPackage::open_referral`] returns the bundled
//!   Open Referral (HSDS) package.
//! - [`ResourceLocator`] decides whether a resource's data is reachable
//!   before anything is scanned.
//!
//! A loaded package is never mutated and can be shared across concurrent
//! validations behind an `Arc`.

pub mod descriptor;
pub mod locator;
pub mod profile;
pub mod registry;

pub use descriptor::{Dialect, PackageDescriptor, ResourceDescriptor, SchemaRef};
pub use locator::ResourceLocator;
pub use registry::{DataPackage, PackageResource};
