use crate::AppState;
use axum::Router;

/// Everything under `/api`.
pub fn api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", super::auth::auth_router())
        .nest("/keys", super::keys::keys_router(state.clone()))
        .nest("/v1", super::shoes::shoes_router(state.clone()))
        .nest("/admin", super::admin::admin_router(state))
}
