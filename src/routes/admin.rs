use crate::handlers::admin;
use crate::middleware::{require_admin, require_auth};
use crate::AppState;
use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};

pub fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        // API keys across all users
        .route("/api-keys", get(admin::list_api_keys))
        .route("/api-keys/inactive", delete(admin::delete_inactive_api_keys))
        .route("/api-keys/:id", delete(admin::delete_api_key))
        .route("/api-keys/:id/toggle", put(admin::toggle_api_key))
        // Stats & logs
        .route("/stats", get(admin::stats))
        .route("/logs", get(admin::logs))
        // Users
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/:id",
            put(admin::update_user).delete(admin::delete_user),
        )
        // Last added runs first: authenticate, then check the role
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
