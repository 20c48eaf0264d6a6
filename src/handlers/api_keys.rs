use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{validate_not_blank, validated};
use crate::auth::{generate_api_key, AuthUser};
use crate::envelope::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::models::api_key::{
    expiry_after_days, ApiKey, KeyScope, KeyStatus, KeyStatusChange, NewApiKey,
};
use crate::middleware::jwt::TOKEN_INVALID;
use crate::store::DatabaseError;
use crate::AppState;

pub const KEY_NOT_FOUND: &str = "API key not found";

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct GenerateKeyRequest {
    /// Display name, 1-100 characters
    #[validate(length(min = 1, max = 100), custom = "validate_not_blank")]
    pub name: String,
    /// Days until expiry; 0 issues a key that is already expired
    #[serde(rename = "expiresInDays", default)]
    #[validate(range(min = 0, max = 3650))]
    pub expires_in_days: Option<i64>,
}

/// Issue a new key for the caller
#[utoipa::path(
    post,
    path = "/api/keys/generate",
    tag = "api-keys",
    request_body = GenerateKeyRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Key issued; data is the full ApiKey including its material"),
        (status = 400, description = "Missing name or out-of-range expiresInDays"),
        (status = 401, description = "Missing or invalid token, or the account no longer exists")
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<GenerateKeyRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ApiKey>>)> {
    let req = validated(req)?;

    let key = state
        .store
        .create_api_key(NewApiKey {
            user_id: user.id,
            api_key: generate_api_key(),
            name: req.name.trim().to_string(),
            expires_at: expiry_after_days(Utc::now(), req.expires_in_days),
        })
        .await
        .map_err(|e| match e {
            // Token outlived its account
            DatabaseError::NotFound => ApiError::Unauthenticated(TOKEN_INVALID.to_string()),
            other => other.into(),
        })?;

    tracing::info!("User {} issued API key {}", user.id, key.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(key).with_message("API key created")),
    ))
}

/// The caller's keys, newest first
#[utoipa::path(
    get,
    path = "/api/keys/list",
    tag = "api-keys",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "data is an array of ApiKey"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<ApiKey>>>> {
    let keys = state.store.list_api_keys_for_user(user.id).await?;
    Ok(Json(ApiResponse::success(keys)))
}

/// Delete one of the caller's keys
#[utoipa::path(
    delete,
    path = "/api/keys/{id}",
    tag = "api-keys",
    params(("id" = i64, Path, description = "API key ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Key deleted"),
        (status = 404, description = "No such key owned by the caller")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<Json<ApiResponse<()>>> {
    delete_scoped(&state, id, KeyScope::Owner(user.id)).await
}

/// Flip one of the caller's keys between active and inactive
#[utoipa::path(
    patch,
    path = "/api/keys/{id}/toggle",
    tag = "api-keys",
    params(("id" = i64, Path, description = "API key ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "data is the new KeyStatusChange"),
        (status = 404, description = "No such key owned by the caller")
    )
)]
pub async fn toggle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<Json<ApiResponse<KeyStatusChange>>> {
    toggle_scoped(&state, id, KeyScope::Owner(user.id)).await
}

/// Shared by the owner and admin toggle routes; only the scope differs.
pub(crate) async fn toggle_scoped(
    state: &AppState,
    id: i64,
    scope: KeyScope,
) -> ApiResult<Json<ApiResponse<KeyStatusChange>>> {
    let status = state
        .store
        .toggle_api_key_status(id, scope)
        .await?
        .ok_or_else(|| ApiError::not_found(KEY_NOT_FOUND))?;

    tracing::info!("API key {} is now {} ({:?})", id, status, scope);

    let message = match status {
        KeyStatus::Active => "API key activated",
        KeyStatus::Inactive => "API key deactivated",
    };
    Ok(Json(
        ApiResponse::success(KeyStatusChange { id, status }).with_message(message),
    ))
}

pub(crate) async fn delete_scoped(
    state: &AppState,
    id: i64,
    scope: KeyScope,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !state.store.delete_api_key(id, scope).await? {
        return Err(ApiError::not_found(KEY_NOT_FOUND));
    }

    tracing::info!("API key {} deleted ({:?})", id, scope);
    Ok(Json(ApiResponse::message("API key deleted")))
}
