//! # orv-cli — Command Line for the Open Referral Validator
//!
//! ## Subcommands
//!
//! - `orv resources`: list the package's resources.
//! - `orv describe <name>`: print a resource definition with its schema.
//! - `orv validate --type <name> <file>`: validate one CSV file.
//! - `orv package <location>`: validate every resource of a data package.
//!
//! ```bash
//! orv validate --type organization organizations.csv
//! orv --datapackage ./hsds/datapackage.json package ./export/datapackage.json --relations
//! ```
//!
//! Every subcommand returns an exit code: 0 when everything is valid, 1
//! otherwise. Operational failures surface as `anyhow` errors.

pub mod catalog;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use orv_package::{DataPackage, ResourceLocator};
use orv_validator::Validator;

/// Settings shared by all subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Descriptor replacing the bundled Open Referral package.
    pub datapackage: Option<String>,
    pub timeout: Duration,
}

/// Loaded package plus the clients to validate against it.
#[derive(Debug, Clone)]
pub struct Context {
    pub validator: Validator,
    pub http: reqwest::Client,
}

impl Context {
    pub async fn load(settings: &Settings) -> Result<Self> {
        let http = orv_table::http_client(settings.timeout).context("failed to build HTTP client")?;
        let locator =
            ResourceLocator::with_timeout(settings.timeout).context("failed to build HTTP client")?;

        let package = match &settings.datapackage {
            Some(location) => DataPackage::load(location, &http).await?,
            None => DataPackage::open_referral()?,
        };
        tracing::debug!(
            resources = package.package_resources().len(),
            "data package ready"
        );

        Ok(Self {
            validator: Validator::new(Some(Arc::new(package)), locator, http.clone()),
            http,
        })
    }

    /// The package every subcommand works against.
    pub fn package(&self) -> Result<&DataPackage> {
        self.validator
            .package()
            .map(|package| package.as_ref())
            .context("no data package loaded")
    }
}
