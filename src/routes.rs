//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod diffs;
mod reports;
mod versions;

use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    let cors = build_cors_layer(settings);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Versions
        .route("/api/versions", post(versions::create_version).get(versions::list_versions))
        .route("/api/versions/by-number/{version}", get(versions::get_version_by_number))
        .route("/api/versions/{id}", get(versions::get_version))
        .route("/api/versions/{id}/migration-plan", get(versions::migration_plan))
        .route("/api/versions/{id}/rollback-plan", get(versions::rollback_plan))

        // Lifecycle
        .route("/api/versions/{id}/approve", post(versions::approve))
        .route("/api/versions/{id}/deploy", post(versions::deploy))
        .route("/api/versions/{id}/rollback", post(versions::rollback))
        .route("/api/versions/{id}/reject", post(versions::reject))

        // Diffs
        .route("/api/diffs", post(diffs::create_diff))
        .route("/api/diffs/{id}", get(diffs::get_diff))

        // Reports
        .route("/api/breaking-changes", get(reports::breaking_changes))
        .route("/api/audit", get(reports::audit_trail))

        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let layer = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };

    layer
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
