use axum::Router;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod store;

use crate::auth::JwtKeys;
use crate::config::Settings;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Settings>,
    pub jwt: JwtKeys,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Settings) -> Self {
        let jwt = JwtKeys::from_settings(&config.auth);
        Self {
            store,
            config: Arc::new(config),
            jwt,
        }
    }
}

/// Create the main Axum application router
pub fn create_app(state: AppState) -> Router {
    let app = Router::new()
        .nest("/api", routes::api::api_router(state.clone()))
        // Health and service info
        .merge(routes::health::health_router())
        // Swagger UI plus the raw document
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        );

    // Dashboard pages only when the static directory exists
    let static_dir = state.config.server.static_dir.clone();
    let app = if static_dir.is_dir() {
        app.merge(routes::pages::pages_router(&static_dir))
    } else {
        tracing::warn!(
            "Static directory {} not found; dashboard pages disabled",
            static_dir.display()
        );
        app.fallback(handlers::health::not_found)
    };

    app.layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}
