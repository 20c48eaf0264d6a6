use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

pub const TOKEN_NOT_FOUND: &str = "token not found";
pub const TOKEN_INVALID: &str = "token invalid or expired";
pub const ADMINS_ONLY: &str = "access denied — admins only";

/// Verifies `Authorization: Bearer <jwt>` and attaches an [`AuthUser`].
pub async fn require_auth(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) =
        auth.ok_or_else(|| ApiError::Unauthenticated(TOKEN_NOT_FOUND.to_string()))?;

    let user = state.jwt.verify(bearer.token()).map_err(|e| {
        tracing::debug!("Bearer token rejected: {:#}", e);
        ApiError::Unauthenticated(TOKEN_INVALID.to_string())
    })?;

    tracing::debug!("Authenticated user {} ({})", user.id, user.role);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Must run after [`require_auth`]. With no identity attached it refuses the request.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::Unauthenticated(TOKEN_NOT_FOUND.to_string()))?;

    if !user.is_admin() {
        tracing::warn!("User {} denied admin access", user.id);
        return Err(ApiError::Forbidden(ADMINS_ONLY.to_string()));
    }

    Ok(next.run(request).await)
}
