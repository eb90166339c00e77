//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health check (intentionally unauthenticated for load balancers)
        .route("/v1/health", get(handlers::health_check))
        // Mirror ingestion
        .route(
            "/v1/packages/{package}/tarball",
            put(handlers::put_package_tarball),
        )
        .route(
            "/v1/packages/{package}/descriptor",
            put(handlers::put_package_descriptor),
        )
        // Mirror client registry (admin)
        .route("/v1/mirrorers", get(handlers::list_mirrorers))
        .route(
            "/v1/mirrorers/{user_id}",
            put(handlers::add_mirrorer).delete(handlers::remove_mirrorer),
        )
        .route("/v1/mirrorers/backup", get(handlers::backup_mirrorers))
        .route("/v1/mirrorers/restore", post(handlers::restore_mirrorers))
        // Admin endpoints
        .route("/v1/admin/accounts", post(handlers::create_account))
        .route("/v1/admin/packages", post(handlers::create_package));

    router
        // Auth middleware (validates token and sets AuthenticatedUser extension)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
