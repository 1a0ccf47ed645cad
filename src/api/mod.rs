use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};

use crate::{auth, AppState};

pub mod handlers;

/// Building-management router, guarded by the admin token.
/// The caller mounts this under `/admin`.
pub fn admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/buildings",
            get(handlers::list_buildings).post(handlers::create_building),
        )
        .route(
            "/buildings/:id/rotate-token",
            post(handlers::rotate_building_token),
        )
        // Registered before the auth layer so unknown paths still answer
        // 401 without credentials, not a route-revealing 404.
        .fallback(fallback_404)
        .layer(middleware::from_fn_with_state(state, auth::admin_auth))
}

/// Tenant router, guarded by the per-building API key.
/// The caller mounts this under `/api/v1`.
pub fn tenant_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/verify", post(handlers::verify_image))
        .route(
            "/vehicles",
            get(handlers::list_vehicles).post(handlers::register_vehicle),
        )
        .route(
            "/vehicles/:plate",
            get(handlers::get_vehicle)
                .put(handlers::update_vehicle)
                .delete(handlers::deactivate_vehicle),
        )
        .route("/logs", get(handlers::list_access_logs))
        .route("/logs/:plate", get(handlers::get_vehicle_logs))
        .fallback(fallback_404)
        .layer(middleware::from_fn_with_state(state, auth::tenant_auth))
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}
