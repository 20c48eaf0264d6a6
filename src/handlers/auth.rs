use crate::auth::{hash_password, verify_password};
use crate::envelope::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::models::user::{NewUser, Role, UserResponse};
use crate::store::DatabaseError;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::validated;

pub const CREDENTIALS_REJECTED: &str = "invalid username or password";
pub const ALREADY_REGISTERED: &str = "username or email already registered";

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// 3-50 characters
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    /// At least 6 characters
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Public fields of a freshly registered account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// HS256 bearer token
    pub token: String,
    pub user: UserResponse,
}

/// Register a new account with the `user` role
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; data is a RegisteredUser"),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Username or email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<ApiResponse<RegisteredUser>>)> {
    let req = validated(req)?;

    if state
        .store
        .username_or_email_taken(&req.username, &req.email)
        .await?
    {
        return Err(ApiError::Conflict(ALREADY_REGISTERED.to_string()));
    }

    let password_hash = hash_password(&req.password).await?;
    let user = state
        .store
        .create_user(NewUser {
            username: req.username,
            email: req.email,
            password_hash,
            role: Role::User,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::AlreadyExists => ApiError::Conflict(ALREADY_REGISTERED.to_string()),
            other => other.into(),
        })?;

    tracing::info!("Registered user {} ({})", user.id, user.username);

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(RegisteredUser {
                id: user.id,
                username: user.username,
                email: user.email,
            })
            .with_message("registration successful"),
        ),
    ))
}

/// Exchange username and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; data is an AuthResponse"),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid username or password"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    let req = validated(req)?;

    // Unknown user and wrong password are indistinguishable to the caller
    let found = state.store.find_user_by_username(&req.username).await?;
    let verified = match &found {
        Some(user) => verify_password(&req.password, &user.password_hash).await,
        None => false,
    };
    let user = match found {
        Some(user) if verified => user,
        _ => {
            tracing::info!("Failed login attempt for {:?}", req.username);
            return Err(ApiError::InvalidCredential(CREDENTIALS_REJECTED.to_string()));
        }
    };

    let token = state.jwt.issue(&user)?;
    tracing::info!("User {} logged in", user.id);

    Ok(Json(
        ApiResponse::success(AuthResponse {
            token,
            user: UserResponse::from(&user),
        })
        .with_message("login successful"),
    ))
}
