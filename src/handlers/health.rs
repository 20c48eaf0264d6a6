use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::envelope::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server and database are reachable; data is a HealthResponse"),
        (status = 500, description = "Database unreachable")
    )
)]
pub async fn check(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<HealthResponse>>> {
    state.store.ping().await?;
    Ok(Json(ApiResponse::success(HealthResponse {
        status: "OK".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })))
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    name: String,
    version: String,
    endpoints: Vec<EndpointFamily>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct EndpointFamily {
    prefix: String,
    auth: String,
}

/// Service name, version and the endpoint families with their gates
#[utoipa::path(
    get,
    path = "/api",
    tag = "health",
    responses((status = 200, description = "Service information", body = ServiceInfo))
)]
pub async fn service_info() -> Json<ServiceInfo> {
    let family = |prefix: &str, auth: &str| EndpointFamily {
        prefix: prefix.to_string(),
        auth: auth.to_string(),
    };

    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: vec![
            family("/api/auth", "none"),
            family("/api/keys", "bearer token"),
            family("/api/v1", "x-api-key header"),
            family("/api/admin", "bearer token (admin role)"),
        ],
    })
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found("endpoint not found")
}
