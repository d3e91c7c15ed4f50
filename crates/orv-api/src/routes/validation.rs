//! # Validation Endpoints
//!
//! ## Endpoints
//!
//! - `POST /validate/csv`: validate an uploaded CSV against a resource type
//! - `GET /validate/datapackage`: validate every resource of a remote or
//!   local data package
//!
//! An invalid CSV is answered with `400` and the full result body.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use orv_core::ValidationResult;
use orv_package::DataPackage;
use orv_table::TableSource;
use orv_validator::{PackageOptions, ResourceOptions};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

const MISSING_TYPE: &str = "Form should contain the field \"type\" with a valid resource name";
const MISSING_FILE: &str = "Form should contain the field \"file\" with a valid resource data stream";
const MISSING_URI: &str = "Query should contain the parameter \"uri\" with a data package location";

/// Multipart form accepted by `POST /validate/csv`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CsvUploadForm {
    /// Resource name the file should conform to.
    #[schema(rename = "type")]
    resource_type: String,
    /// CSV content.
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// 1-based header row; `0` when the file has no header. Defaults to 1.
    #[schema(rename = "headersRow")]
    headers_row: Option<u64>,
}

/// Query parameters of `GET /validate/datapackage`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PackageQuery {
    /// Location of the `datapackage.json`, a URL or a server-local path.
    pub uri: Option<String>,
    /// Check foreign keys against referenced resources.
    #[serde(default)]
    pub relations: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/validate/csv", post(validate_csv))
        .route("/validate/datapackage", get(validate_datapackage))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /validate/csv: Validate an uploaded CSV file.
#[utoipa::path(
    post,
    path = "/validate/csv",
    request_body(content = CsvUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "The file is valid", body = ValidationResult),
        (status = 400, description = "The file is invalid, or the form is incomplete", body = ValidationResult),
        (status = 404, description = "Unknown resource type", body = crate::error::ErrorBody),
    ),
    tag = "validation"
)]
pub async fn validate_csv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ValidationResult>), AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut resource_type = None;
    let mut file = None;
    let mut headers_row = Some(1);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("type") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                resource_type = Some(text.trim().to_string()).filter(|t| !t.is_empty());
            }
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                file = Some(bytes);
            }
            Some("headersRow") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                headers_row = parse_headers_row(&text)?;
            }
            other => tracing::debug!(field = ?other, "ignoring form field"),
        }
    }

    let resource_type = resource_type.ok_or_else(|| AppError::BadRequest(MISSING_TYPE.to_string()))?;
    let file = file.ok_or_else(|| AppError::BadRequest(MISSING_FILE.to_string()))?;

    let result = state
        .validator
        .validate_resource(
            Some(TableSource::Bytes(file)),
            Some(&resource_type),
            ResourceOptions { headers_row },
        )
        .await?;

    let status = if result.valid {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(result)))
}

/// GET /validate/datapackage: Validate every resource of a data package.
#[utoipa::path(
    get,
    path = "/validate/datapackage",
    params(PackageQuery),
    responses(
        (status = 200, description = "One result per resource, in declaration order", body = Vec<ValidationResult>),
        (status = 400, description = "Missing or unloadable package", body = crate::error::ErrorBody),
    ),
    tag = "validation"
)]
pub async fn validate_datapackage(
    State(state): State<AppState>,
    Query(query): Query<PackageQuery>,
) -> Result<Json<Vec<ValidationResult>>, AppError> {
    let uri = query
        .uri
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest(MISSING_URI.to_string()))?;

    let package = DataPackage::load(uri, &state.http).await?;
    let results = state
        .validator
        .with_package(Arc::new(package))
        .validate_package(PackageOptions {
            relations: query.relations,
        })
        .await?;
    Ok(Json(results))
}

fn parse_headers_row(raw: &str) -> Result<Option<u64>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Some(1));
    }
    match raw.parse::<u64>() {
        Ok(0) => Ok(None),
        Ok(row) => Ok(Some(row)),
        Err(_) => Err(AppError::BadRequest(format!(
            "Form field \"headersRow\" should be a non-negative integer, got \"{raw}\""
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_row_parsing() {
        assert_eq!(parse_headers_row("").unwrap(), Some(1));
        assert_eq!(parse_headers_row(" 3 ").unwrap(), Some(3));
        assert_eq!(parse_headers_row("0").unwrap(), None);
        assert!(parse_headers_row("first").is_err());
        assert!(parse_headers_row("-1").is_err());
    }
}
