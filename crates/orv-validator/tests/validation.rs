//! End-to-end validation against the bundled Open Referral package and a
//! small on-disk fixture package.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use orv_core::ValidatorError;
use orv_package::{DataPackage, ResourceLocator};
use orv_table::TableSource;
use orv_validator::{PackageOptions, ResourceOptions, Validator};

fn fixture_package() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data/package/datapackage.json")
        .display()
        .to_string()
}

fn http() -> reqwest::Client {
    orv_table::http_client(Duration::from_secs(5)).unwrap()
}

fn validator_for(package: DataPackage) -> Validator {
    Validator::new(
        Some(Arc::new(package)),
        ResourceLocator::with_timeout(Duration::from_secs(5)).unwrap(),
        http(),
    )
}

fn open_referral() -> Validator {
    validator_for(DataPackage::open_referral().unwrap())
}

async fn fixture() -> Validator {
    validator_for(DataPackage::load(&fixture_package(), &http()).await.unwrap())
}

fn csv_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const HEADERS: ResourceOptions = ResourceOptions {
    headers_row: Some(1),
};

#[tokio::test]
async fn valid_csv_file_passes() {
    let file = csv_file(
        "id,organization_id,name,alternate_name\n\
         1,c89eb05c-62dd-4b64-b494-0cc347b6ea7f,Program name,Alternate name\n",
    );
    let result = open_referral()
        .validate_resource(
            Some(TableSource::Path(file.path().to_path_buf())),
            Some("program"),
            HEADERS,
        )
        .await
        .unwrap();
    assert!(result.valid);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn wrong_headers_report_expected_fields() {
    let file = csv_file("a,b,c\n1,2,3\n4,5,6\n");
    let result = open_referral()
        .validate_resource(
            Some(TableSource::Path(file.path().to_path_buf())),
            Some("program"),
            HEADERS,
        )
        .await
        .unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].row, Some(1));
    assert_eq!(result.errors[0].col, None);
    assert_eq!(
        result.errors[0].details.as_deref(),
        Some("Expected fields (in order): id, organization_id, name, alternate_name")
    );
}

#[tokio::test]
async fn header_row_can_sit_below_a_preamble() {
    let file = csv_file(
        "exported by some tool\n\
         id,organization_id,name,alternate_name\n\
         1,org,Program name,\n",
    );
    let result = open_referral()
        .validate_resource(
            Some(TableSource::Path(file.path().to_path_buf())),
            Some("program"),
            ResourceOptions {
                headers_row: Some(2),
            },
        )
        .await
        .unwrap();
    assert!(result.valid, "{:?}", result.errors);
}

#[tokio::test]
async fn enum_violation_is_located() {
    let file = csv_file(
        "id,location_id,accessibility,details\n\
         1,1,cd,details go here\n\
         2,1,bad_enum,details go here\n",
    );
    let result = open_referral()
        .validate_resource(
            Some(TableSource::Path(file.path().to_path_buf())),
            Some("accessibility_for_disabilities"),
            HEADERS,
        )
        .await
        .unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].row, Some(3));
    assert_eq!(result.errors[0].col, Some(3));
    assert!(result.errors[0].description.contains("constraint \"enum\""));
}

#[tokio::test]
async fn every_bad_cell_in_a_row_is_reported() {
    let file = csv_file(
        "id,name,alternate_name,description,email,url,tax_status,tax_id,year_incorporated,legal_status\n\
         aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaa1,org A,alter org A,A descr,@example.com,http:example.com,tax status,1,1990-01-01,private\n",
    );
    let result = open_referral()
        .validate_resource(
            Some(TableSource::Path(file.path().to_path_buf())),
            Some("organization"),
            HEADERS,
        )
        .await
        .unwrap();
    assert_eq!(result.errors.len(), 2);
    let cols: Vec<_> = result.errors.iter().map(|e| (e.row, e.col)).collect();
    assert_eq!(cols, vec![(Some(2), Some(5)), (Some(2), Some(6))]);
}

#[tokio::test]
async fn missing_source_is_rejected() {
    let err = open_referral()
        .validate_resource(None, Some("organization"), HEADERS)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ValidatorError::Precondition("A valid data source is required".into())
    );
}

#[tokio::test]
async fn resource_names_ignore_case() {
    let file = csv_file("id,location_id,accessibility,details\n1,1,ramp,\n");
    let source = Some(TableSource::Path(file.path().to_path_buf()));
    let validator = open_referral();
    let lower = validator
        .validate_resource(source.clone(), Some("accessibility_for_disabilities"), HEADERS)
        .await
        .unwrap();
    let upper = validator
        .validate_resource(source, Some("Accessibility_For_Disabilities"), HEADERS)
        .await
        .unwrap();
    assert_eq!(lower, upper);
    assert!(lower.valid);
}

#[tokio::test]
async fn package_results_follow_declaration_order() {
    let results = fixture()
        .await
        .validate_package(PackageOptions::default())
        .await
        .unwrap();
    let names: Vec<_> = results.iter().map(|r| r.resource.as_deref()).collect();
    assert_eq!(
        names,
        vec![
            Some("organization"),
            Some("program"),
            Some("note"),
            Some("contact"),
            Some("phone")
        ]
    );

    assert!(!results[0].valid);
    assert_eq!(results[0].errors.len(), 1);
    assert_eq!(results[0].errors[0].row, Some(3));
    assert_eq!(results[0].errors[0].col, Some(3));

    assert!(results[1].valid);

    assert!(!results[3].valid);
    assert_eq!(results[3].errors.len(), 1);
    assert_eq!(results[3].errors[0].description, "resource not available");
    assert_eq!(results[3].errors[0].row, None);

    assert!(results[4].valid);
}

#[tokio::test]
async fn failing_resource_does_not_stop_the_package() {
    let results = fixture()
        .await
        .validate_package(PackageOptions::default())
        .await
        .unwrap();

    let note = &results[2];
    assert_eq!(note.resource.as_deref(), Some("note"));
    assert!(!note.valid);
    assert_eq!(note.errors.len(), 1);
    assert_eq!(
        note.errors[0].description,
        "No schema found for validating this type of resource"
    );
    assert_eq!(note.errors[0].row, None);
    assert_eq!(note.errors[0].col, None);

    let phone = &results[4];
    assert_eq!(phone.resource.as_deref(), Some("phone"));
    assert!(phone.valid);
    assert!(phone.errors.is_empty());
}

#[tokio::test]
async fn package_relations_check_foreign_keys() {
    let results = fixture()
        .await
        .validate_package(PackageOptions { relations: true })
        .await
        .unwrap();
    let program = &results[1];
    assert!(!program.valid);
    assert_eq!(program.errors.len(), 1);
    assert_eq!(program.errors[0].row, Some(3));
    assert!(program.errors[0]
        .description
        .contains("Foreign key \"organization_id\" violation in row 3"));
}

#[tokio::test]
async fn package_validation_is_idempotent() {
    let validator = fixture().await;
    let first = validator
        .validate_package(PackageOptions::default())
        .await
        .unwrap();
    let second = validator
        .validate_package(PackageOptions::default())
        .await
        .unwrap();
    assert_eq!(first, second);
}
