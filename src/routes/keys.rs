use crate::handlers::api_keys;
use crate::middleware::require_auth;
use crate::AppState;
use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

/// Key management for the signed-in user. Every route requires a bearer token.
pub fn keys_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/generate", post(api_keys::generate))
        .route("/list", get(api_keys::list))
        .route("/:id", delete(api_keys::delete))
        .route("/:id/toggle", patch(api_keys::toggle))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
