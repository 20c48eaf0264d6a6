use crate::handlers::shoes;
use crate::middleware::require_api_key;
use crate::AppState;
use axum::{middleware, routing::get, Router};

/// Public catalog behind the `x-api-key` gate. Only matched routes pass through
/// the gate, so unknown paths are neither counted nor logged.
pub fn shoes_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/shoes", get(shoes::list))
        .route("/shoes/search", get(shoes::search))
        .route("/shoes/:id", get(shoes::get))
        .route("/categories", get(shoes::categories))
        .route("/brands", get(shoes::brands))
        .route_layer(middleware::from_fn_with_state(state, require_api_key))
}
