use axum::{handler::HandlerWithoutStateExt, Router};
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

use crate::handlers::health::not_found;
use crate::AppState;

/// Page routes and the file each one serves from the static directory.
const PAGES: &[(&str, &str)] = &[
    ("/", "index.html"),
    ("/login", "login.html"),
    ("/register", "register.html"),
    ("/dashboard", "dashboard.html"),
    ("/admin", "admin.html"),
    ("/docs", "docs.html"),
];

/// Dashboard pages plus every other file under `static_dir`. Anything that
/// is not a file falls through to the JSON 404 envelope.
pub fn pages_router(static_dir: &Path) -> Router<AppState> {
    let router = PAGES.iter().fold(Router::new(), |router, (route, file)| {
        router.route_service(route, ServeFile::new(static_dir.join(file)))
    });

    router.fallback_service(
        ServeDir::new(static_dir)
            .call_fallback_on_method_not_allowed(true)
            .not_found_service(not_found.into_service()),
    )
}
