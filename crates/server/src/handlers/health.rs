//! Health check handler.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
    pub metadata: &'static str,
}

/// GET /v1/health
///
/// Unauthenticated, for load balancer probes. Reports degraded with a 500
/// when a backing store is unreachable.
pub async fn health_check(
    State(state): State<AppState>,
) -> ApiResult<Json<HealthResponse>> {
    let storage_ok = state.storage.health_check().await.is_ok();
    let metadata_ok = state.metadata.health_check().await.is_ok();

    if storage_ok && metadata_ok {
        Ok(Json(HealthResponse {
            status: "ok",
            storage: "ok",
            metadata: "ok",
        }))
    } else {
        Err(ApiError::Internal(format!(
            "degraded: storage={}, metadata={}",
            if storage_ok { "ok" } else { "unreachable" },
            if metadata_ok { "ok" } else { "unreachable" },
        )))
    }
}
