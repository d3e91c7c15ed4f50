//! # Resource Catalogue
//!
//! Read-only views of the loaded data package.
//!
//! ## Endpoints
//!
//! - `GET /resources`: resource summaries in declaration order
//! - `GET /resources/{name}`: full definition with key-tagged schema

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use orv_core::{ResourceDefinition, ResourceSummary};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/resources", get(list_resources))
        .route("/resources/{name}", get(get_resource))
}

/// GET /resources: List the package's resources.
#[utoipa::path(
    get,
    path = "/resources",
    responses(
        (status = 200, description = "Resource summaries", body = Vec<ResourceSummary>),
        (status = 503, description = "No package loaded", body = crate::error::ErrorBody),
    ),
    tag = "resources"
)]
pub async fn list_resources(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResourceSummary>>, AppError> {
    let package = state
        .validator
        .package()
        .ok_or_else(|| AppError::Unavailable("No data package has been loaded".to_string()))?;
    Ok(Json(package.resources()))
}

/// GET /resources/{name}: Describe one resource.
#[utoipa::path(
    get,
    path = "/resources/{name}",
    params(("name" = String, Path, description = "Resource name, case-insensitive")),
    responses(
        (status = 200, description = "Resource definition", body = ResourceDefinition),
        (status = 404, description = "Unknown resource", body = crate::error::ErrorBody),
    ),
    tag = "resources"
)]
pub async fn get_resource(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ResourceDefinition>, AppError> {
    let package = state
        .validator
        .package()
        .ok_or_else(|| AppError::Unavailable("No data package has been loaded".to_string()))?;
    Ok(Json(package.get_definition(&name, true)?))
}
