//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` on the pool
/// 2. **Cache**: Redis PING
/// 3. **Catalog**: COMMON and RARE pools each hold an active card
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (database, cache, catalog) = tokio::join!(
        check_database(&state),
        check_cache(&state),
        check_catalog(&state)
    );

    let all_healthy = database.is_ok() && cache.is_ok() && catalog.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            cache,
            catalog,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    let Some(pool) = &state.db else {
        return CheckStatus::ok("In-memory store");
    };

    match sqlx::query("SELECT 1").execute(pool.as_ref()).await {
        Ok(_) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    if state.cache.health_check().await {
        CheckStatus::ok("Cache reachable")
    } else {
        CheckStatus::error("Redis connection failed")
    }
}

async fn check_catalog(state: &AppState) -> CheckStatus {
    match state.card_service.check_provisioning().await {
        Ok(report) if report.is_ready() => CheckStatus::ok(format!(
            "{} common, {} rare active cards",
            report.active_common, report.active_rare
        )),
        Ok(report) => CheckStatus::error(format!(
            "Fallback pools incomplete: {} common, {} rare active cards",
            report.active_common, report.active_rare
        )),
        Err(e) => CheckStatus::error(format!("Catalog error: {}", e)),
    }
}
