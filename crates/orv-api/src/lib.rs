//! # orv-api — HTTP Service for the Open Referral Validator
//!
//! ## API Surface
//!
//! | Route                          | Module                  |
//! |--------------------------------|-------------------------|
//! | `GET /resources`               | [`routes::resources`]   |
//! | `GET /resources/{name}`        | [`routes::resources`]   |
//! | `POST /validate/csv`           | [`routes::validation`]  |
//! | `GET /validate/datapackage`    | [`routes::validation`]  |
//! | `GET /openapi.json`            | [`openapi`]             |
//! | `GET /health`, `/health/readiness` | probes              |
//!
//! API routes pass through `TraceLayer` and a permissive CORS layer.

pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::resources::router())
        .merge(routes::validation::router())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let health = Router::new()
        .route("/health", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}
