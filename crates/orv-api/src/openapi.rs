//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Open Referral Validator",
        version = "0.1.0",
        description = "Validates CSV resources and data packages against the Open Referral (HSDS) table schemas.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::resources::list_resources,
        crate::routes::resources::get_resource,
        crate::routes::validation::validate_csv,
        crate::routes::validation::validate_datapackage,
    ),
    components(schemas(
        orv_core::ResourceSummary,
        orv_core::ResourceDefinition,
        orv_core::SourceLocator,
        orv_core::SchemaDescriptor,
        orv_core::FieldDefinition,
        orv_core::FieldType,
        orv_core::Constraints,
        orv_core::FieldKeys,
        orv_core::ForeignKeyTag,
        orv_core::ForeignKey,
        orv_core::ForeignKeyReference,
        orv_core::KeyFields,
        orv_core::ValidationError,
        orv_core::ValidationResult,
        crate::routes::validation::CsvUploadForm,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "resources", description = "Resource catalogue of the loaded data package"),
        (name = "validation", description = "CSV and data package validation"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/resources",
            "/resources/{name}",
            "/validate/csv",
            "/validate/datapackage",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn document_carries_result_schema() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.schemas.contains_key("ValidationResult"));
        assert!(components.schemas.contains_key("ErrorBody"));
    }
}
