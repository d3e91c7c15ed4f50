//! # Validation Orchestrator
//!
//! Public entry points of the validation core.
//!
//! - [`Validator::validate_resource`] checks one data source against a named
//!   resource schema. Missing input and unknown names are returned as
//!   errors; data problems are reported in the result.
//! - [`Validator::validate_package`] checks every resource of the loaded
//!   package, in declaration order. A problem with one resource is recorded
//!   in that resource's result and never stops the others.
//!
//! Resources are scanned one at a time and rows strictly in source order.

use std::sync::Arc;

use orv_core::{SchemaDescriptor, ValidationError, ValidationResult, ValidatorError};
use orv_package::{DataPackage, PackageResource, ResourceLocator};
use orv_table::TableSource;

use crate::resolver::{self, Failure};
use crate::scanner::{RowScanner, ScanEvent, ScanOptions};

const MISSING_SOURCE: &str = "A valid data source is required";
const MISSING_RESOURCE_NAME: &str = "A valid Open Referral resource name should be provided";
const MISSING_SCHEMA: &str = "No schema found for validating this type of resource";
const MISSING_PACKAGE: &str = "No data package has been loaded";
const RESOURCE_NOT_AVAILABLE: &str = "resource not available";

/// Options for [`Validator::validate_resource`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    /// 1-based physical header row; `None` when the data has no headers.
    pub headers_row: Option<u64>,
}

/// Options for [`Validator::validate_package`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageOptions {
    /// Check foreign keys against the referenced resources.
    pub relations: bool,
}

/// Validation entry point bound to an optional package handle.
#[derive(Debug, Clone)]
pub struct Validator {
    package: Option<Arc<DataPackage>>,
    locator: ResourceLocator,
    http: reqwest::Client,
}

impl Validator {
    /// `http` reads remote sources; `locator` probes existence.
    pub fn new(
        package: Option<Arc<DataPackage>>,
        locator: ResourceLocator,
        http: reqwest::Client,
    ) -> Self {
        Self {
            package,
            locator,
            http,
        }
    }

    /// A validator over `package` sharing this one's clients.
    pub fn with_package(&self, package: Arc<DataPackage>) -> Self {
        Self {
            package: Some(package),
            locator: self.locator.clone(),
            http: self.http.clone(),
        }
    }

    pub fn package(&self) -> Option<&Arc<DataPackage>> {
        self.package.as_ref()
    }

    fn require_package(&self) -> Result<&Arc<DataPackage>, ValidatorError> {
        self.package
            .as_ref()
            .ok_or_else(|| ValidatorError::State(MISSING_PACKAGE.to_string()))
    }

    /// Validate `source` against the schema of `resource_name`.
    pub async fn validate_resource(
        &self,
        source: Option<TableSource>,
        resource_name: Option<&str>,
        options: ResourceOptions,
    ) -> Result<ValidationResult, ValidatorError> {
        let source = source.ok_or_else(|| ValidatorError::Precondition(MISSING_SOURCE.to_string()))?;
        let name = resource_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ValidatorError::Precondition(MISSING_RESOURCE_NAME.to_string()))?;

        let package = self.require_package()?;
        let resource = package.resource(name)?;
        let schema = resource
            .schema()
            .ok_or_else(|| ValidatorError::Precondition(MISSING_SCHEMA.to_string()))?;

        let scan_options = ScanOptions {
            headers_row: options.headers_row,
            relations: None,
        };
        let scanner = RowScanner::open(&source, schema, scan_options, &self.http).await;
        let errors = collect_errors(scanner, schema);

        tracing::info!(
            resource = resource.name(),
            source = %source.describe(),
            valid = errors.is_empty(),
            errors = errors.len(),
            "resource validated"
        );
        Ok(ValidationResult::from_errors(errors))
    }

    /// Validate every resource of the loaded package.
    pub async fn validate_package(
        &self,
        options: PackageOptions,
    ) -> Result<Vec<ValidationResult>, ValidatorError> {
        let package = self.require_package()?;
        let mut results = Vec::with_capacity(package.package_resources().len());

        for resource in package.package_resources() {
            let errors = match self.scan_package_resource(package, resource, options).await {
                Ok(errors) => errors,
                Err(err) => resolver::resolve(resource.schema(), Failure::Request(err)),
            };
            tracing::debug!(
                resource = resource.name(),
                errors = errors.len(),
                "package resource validated"
            );
            results.push(ValidationResult::from_errors(errors).for_resource(resource.name()));
        }

        tracing::info!(
            package = package.name().unwrap_or_default(),
            resources = results.len(),
            invalid = results.iter().filter(|r| !r.valid).count(),
            relations = options.relations,
            "package validated"
        );
        Ok(results)
    }

    async fn scan_package_resource(
        &self,
        package: &DataPackage,
        resource: &PackageResource,
        options: PackageOptions,
    ) -> Result<Vec<ValidationError>, ValidatorError> {
        if !self.locator.exists(resource).await {
            return Ok(vec![ValidationError::new(RESOURCE_NOT_AVAILABLE)]);
        }
        let schema = resource
            .schema()
            .ok_or_else(|| ValidatorError::Precondition(MISSING_SCHEMA.to_string()))?;
        let source = resource
            .table_source()
            .ok_or_else(|| ValidatorError::Precondition(MISSING_SOURCE.to_string()))?;

        let relations = if options.relations {
            Some(package.read_relations(schema, &self.http).await)
        } else {
            None
        };
        let scan_options = ScanOptions {
            headers_row: resource.headers_row(),
            relations,
        };
        let scanner = RowScanner::open(&source, schema, scan_options, &self.http).await;
        Ok(collect_errors(scanner, schema))
    }
}

/// Drain a scan into resolved errors, stopping after a header mismatch or a
/// fatal failure.
fn collect_errors(scanner: RowScanner, schema: &SchemaDescriptor) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for event in scanner {
        let resolved = match event {
            ScanEvent::Row(_) => continue,
            ScanEvent::RowFailure(err) => resolver::resolve(Some(schema), Failure::Cast(err)),
            ScanEvent::FatalFailure(message) => {
                errors.extend(resolver::resolve(Some(schema), Failure::Fatal { message }));
                break;
            }
        };
        let stop = resolver::is_headers_mismatch(&resolved);
        errors.extend(resolved);
        if stop {
            break;
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn validator() -> Validator {
        let package = DataPackage::open_referral().unwrap();
        Validator::new(
            Some(Arc::new(package)),
            ResourceLocator::with_timeout(Duration::from_secs(5)).unwrap(),
            orv_table::http_client(Duration::from_secs(5)).unwrap(),
        )
    }

    fn inline(rows: &[&[&str]]) -> Option<TableSource> {
        Some(TableSource::Inline(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        ))
    }

    const WITH_HEADERS: ResourceOptions = ResourceOptions {
        headers_row: Some(1),
    };

    #[tokio::test]
    async fn missing_source_is_a_precondition_error() {
        let err = validator()
            .validate_resource(None, Some("organization"), WITH_HEADERS)
            .await
            .unwrap_err();
        assert_eq!(err, ValidatorError::Precondition(MISSING_SOURCE.into()));
    }

    #[tokio::test]
    async fn missing_name_is_a_precondition_error() {
        let err = validator()
            .validate_resource(inline(&[&["1"]]), None, WITH_HEADERS)
            .await
            .unwrap_err();
        assert_eq!(err, ValidatorError::Precondition(MISSING_RESOURCE_NAME.into()));

        let err = validator()
            .validate_resource(inline(&[&["1"]]), Some("  "), WITH_HEADERS)
            .await
            .unwrap_err();
        assert!(err.is_precondition());
    }

    #[tokio::test]
    async fn unknown_resource_propagates_not_found() {
        let err = validator()
            .validate_resource(inline(&[&["1"]]), Some("unicorn"), WITH_HEADERS)
            .await
            .unwrap_err();
        assert!(matches!(err, ValidatorError::NotFound(_)));
    }

    #[tokio::test]
    async fn matching_rows_are_valid() {
        let result = validator()
            .validate_resource(
                inline(&[
                    &["id", "organization_id", "name", "alternate_name"],
                    &["1", "c89eb05c-62dd-4b64-b494-0cc347b6ea7f", "Program name", "Alternate name"],
                ]),
                Some("program"),
                WITH_HEADERS,
            )
            .await
            .unwrap();
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.resource.is_none());
    }

    #[tokio::test]
    async fn positional_rows_without_headers() {
        let result = validator()
            .validate_resource(
                inline(&[&["1", "org", "Program name", ""]]),
                Some("PROGRAM"),
                ResourceOptions::default(),
            )
            .await
            .unwrap();
        assert!(result.valid);
    }

    #[tokio::test]
    async fn header_mismatch_stops_the_scan() {
        let result = validator()
            .validate_resource(
                inline(&[
                    &["a", "b", "c"],
                    &["1", "c89eb05c-62dd-4b64-b494-0cc347b6ea7f", "Program name"],
                    &["2", "x"],
                ]),
                Some("program"),
                WITH_HEADERS,
            )
            .await
            .unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        let err = &result.errors[0];
        assert_eq!(err.row, Some(1));
        assert_eq!(err.col, None);
        assert_eq!(
            err.description,
            "The column header names do not match the field names in the schema"
        );
        assert_eq!(
            err.details.as_deref(),
            Some("Expected fields (in order): id, organization_id, name, alternate_name")
        );
    }

    #[tokio::test]
    async fn bad_enum_value_reports_its_column() {
        let result = validator()
            .validate_resource(
                inline(&[
                    &["id", "location_id", "accessibility", "details"],
                    &["1", "1", "cd", "details go here"],
                    &["2", "1", "bad_enum", "details go here"],
                ]),
                Some("accessibility_for_disabilities"),
                WITH_HEADERS,
            )
            .await
            .unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, Some(3));
        assert_eq!(result.errors[0].col, Some(3));
    }

    #[tokio::test]
    async fn two_bad_columns_share_a_row() {
        let result = validator()
            .validate_resource(
                inline(&[
                    &[
                        "id", "name", "alternate_name", "description", "email", "url",
                        "tax_status", "tax_id", "year_incorporated", "legal_status",
                    ],
                    &[
                        "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaa1", "org A", "alter org A", "A descr",
                        "@example.com", "http:example.com", "tax status", "1", "1990-01-01", "private",
                    ],
                ]),
                Some("organization"),
                WITH_HEADERS,
            )
            .await
            .unwrap();
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.iter().all(|e| e.row == Some(2)));
        assert_eq!(result.errors[0].col, Some(5));
        assert_eq!(result.errors[1].col, Some(6));
    }

    #[tokio::test]
    async fn validation_is_idempotent() {
        let validator = validator();
        let source = inline(&[
            &["id", "location_id", "accessibility", "details"],
            &["1", "1", "nope", ""],
        ]);
        let first = validator
            .validate_resource(source.clone(), Some("accessibility_for_disabilities"), WITH_HEADERS)
            .await
            .unwrap();
        let second = validator
            .validate_resource(source, Some("accessibility_for_disabilities"), WITH_HEADERS)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert!(!first.valid);
    }

    #[tokio::test]
    async fn package_validation_requires_a_package() {
        let validator = Validator::new(
            None,
            ResourceLocator::with_timeout(Duration::from_secs(5)).unwrap(),
            orv_table::http_client(Duration::from_secs(5)).unwrap(),
        );
        let err = validator
            .validate_package(PackageOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ValidatorError::State(_)));

        let err = validator
            .validate_resource(inline(&[&["1"]]), Some("program"), WITH_HEADERS)
            .await
            .unwrap_err();
        assert!(matches!(err, ValidatorError::State(_)));
    }
}
