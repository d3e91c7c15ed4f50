//! # orv-api — Binary Entry Point
//!
//! Starts the validator HTTP service. Configuration comes from the
//! environment, see [`AppConfig::from_env`].

use orv_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState::load(config).await.map_err(|e| {
        tracing::error!("Startup failed: {e}");
        e
    })?;
    if let Some(package) = state.validator.package() {
        tracing::info!(
            package = package.name().unwrap_or("open-referral"),
            resources = package.package_resources().len(),
            "serving data package"
        );
    }

    let app = orv_api::app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Open Referral validator listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
