//! SchemaFlow Versioning - Schema Version History & Migration Planning
//!
//! Every submitted schema snapshot becomes an immutable, content-addressed
//! version with a semantic version number. Between consecutive versions the
//! service computes:
//! - Structural diffs with impact levels
//! - Breaking-change classification with mitigation and rollback guidance
//! - Ordered migration plans and rollback plans
//!
//! Versions move through a review lifecycle (draft, review, approved,
//! deployed, rolled back, rejected) and every operation lands in an audit
//! trail.

mod config;
mod error;
mod models;
mod routes;
mod schema;
mod state;
mod versioning;

use crate::config::Settings;
use crate::error::AppError;
use crate::routes::create_router;
use crate::state::AppState;
use crate::versioning::VersioningEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("🚀 Starting SchemaFlow Versioning...");

    let settings = Settings::load().map_err(AppError::from)?;
    info!("📋 Configuration loaded successfully");

    let engine = VersioningEngine::with_config(settings.versioning.clone());
    spawn_event_logger(&engine);

    let state = Arc::new(AppState::new(engine));
    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Versions ───");
    info!("   POST /api/versions                       - Create version from schema");
    info!("   GET  /api/versions                       - List versions");
    info!("   GET  /api/versions/{{id}}                  - Get version");
    info!("   GET  /api/versions/by-number/{{version}}   - Get version by number");
    info!("   GET  /api/versions/{{id}}/migration-plan   - Migration plan");
    info!("   GET  /api/versions/{{id}}/rollback-plan    - Rollback plan");
    info!("");
    info!("   ─── Lifecycle ───");
    info!("   POST /api/versions/{{id}}/approve          - Approve version");
    info!("   POST /api/versions/{{id}}/deploy           - Mark deployed");
    info!("   POST /api/versions/{{id}}/rollback         - Mark rolled back");
    info!("   POST /api/versions/{{id}}/reject           - Reject version");
    info!("");
    info!("   ─── Analysis ───");
    info!("   POST /api/diffs                          - Diff two versions");
    info!("   GET  /api/diffs/{{id}}                     - Get diff");
    info!("   GET  /api/breaking-changes               - Breaking change summary");
    info!("   GET  /api/audit                          - Audit trail");
    info!("");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,schemaflow_versioning=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Log every versioning event until the engine goes away
fn spawn_event_logger(engine: &VersioningEngine) {
    let mut events = engine.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => debug!(target: "schemaflow_versioning::events", "{}", json),
                    Err(e) => warn!("Failed to serialize event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event logger lagged, skipped {} events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
