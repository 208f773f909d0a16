/// Health check endpoints for liveness and readiness probes
///
/// Supports two types of probes:
/// - Liveness: Is the process alive? (restart if not)
/// - Readiness: Can the upstream community catalog be served? (remove from
///   load balancer if not)

use crate::context::AppContext;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness_probe))
        .route("/health/ready", get(readiness_probe))
}

/// Basic health check
pub async fn health_basic() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe
///
/// If we can respond, we're alive
pub async fn liveness_probe() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe
///
/// Ready once the community catalog is cached or can be fetched. A successful
/// check warms the catalog cache for the first real request.
pub async fn readiness_probe(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let catalog = match ctx.directory.list_communities().await {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::warn!(error = %e, "readiness_probe_failed: community catalog unavailable");
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    };

    Ok(Json(serde_json::json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION"),
        "communities": catalog.len(),
        "cached_details": ctx.directory.cached_detail_count(),
        "cache": ctx.directory.stats(),
    })))
}
