use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::envelope::Pagination;
use crate::handlers::{api_keys, auth, health, shoes};
use crate::models::api_key::{ApiKey as ApiKeyRecord, KeyStatus, KeyStatusChange};
use crate::models::shoe::Shoe;
use crate::models::user::{Role, UserResponse};

/// Generate the OpenAPI documentation for the entire API
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        health::check,
        health::service_info,

        // Auth endpoints
        auth::register,
        auth::login,

        // Key management
        api_keys::generate,
        api_keys::list,
        api_keys::delete,
        api_keys::toggle,

        // Catalog
        shoes::list,
        shoes::search,
        shoes::get,
        shoes::categories,
        shoes::brands,
    ),
    components(
        schemas(
            health::HealthResponse,
            health::ServiceInfo,
            health::EndpointFamily,
            UserResponse,
            Role,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::RegisteredUser,
            auth::AuthResponse,
            api_keys::GenerateKeyRequest,
            ApiKeyRecord,
            KeyStatus,
            KeyStatusChange,
            Shoe,
            Pagination,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "api-keys", description = "API key management for the signed-in user"),
        (name = "shoes", description = "Public catalog, requires an x-api-key header"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-api-key"))),
            );
        }
    }
}
