//! # API Route Modules
//!
//! - `resources`: catalogue of the loaded data package.
//! - `validation`: CSV upload and data package validation.

pub mod resources;
pub mod validation;
