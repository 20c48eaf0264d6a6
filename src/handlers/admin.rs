use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::api_keys::{delete_scoped, toggle_scoped};
use super::auth::ALREADY_REGISTERED;
use super::{resolve_page, validated};
use crate::auth::{hash_password, AuthUser};
use crate::envelope::{ApiResponse, Pagination};
use crate::error::{ApiError, ApiResult};
use crate::models::access_log::AccessLogView;
use crate::models::api_key::{ApiKeyWithOwner, KeyScope, KeyStatus, KeyStatusChange};
use crate::models::stats::ApiStats;
use crate::models::user::{NewUser, Role, UserResponse, UserSummary, UserUpdate};
use crate::store::{ApiKeyFilter, DatabaseError, LogFilter};
use crate::AppState;

const DEFAULT_KEY_PAGE_SIZE: u32 = 20;
const MAX_KEY_PAGE_SIZE: u32 = 100;
const RECENT_LOG_COUNT: u32 = 10;
const DEFAULT_LOG_LIMIT: u32 = 100;
const MAX_LOG_LIMIT: u32 = 500;
const USER_NOT_FOUND: &str = "user not found";

#[derive(Debug, Default, Deserialize)]
pub struct KeyListQuery {
    /// `active` or `inactive`; blank means no filter
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    /// First day included, `YYYY-MM-DD`
    pub start: Option<String>,
    /// Last day included, `YYYY-MM-DD`
    pub end: Option<String>,
    /// Username substring
    pub user: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    pub role: Option<Role>,
    #[validate(length(min = 6, max = 128))]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResult {
    pub deleted: u64,
}

pub async fn list_api_keys(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<KeyListQuery>, ApiError>,
) -> ApiResult<Json<ApiResponse<Vec<ApiKeyWithOwner>>>> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<KeyStatus>()
                .map_err(|_| ApiError::validation("status must be active or inactive"))?,
        ),
    };
    let page = resolve_page(query.page, query.limit, DEFAULT_KEY_PAGE_SIZE, MAX_KEY_PAGE_SIZE)?;

    let (keys, total) = state
        .store
        .list_api_keys(&ApiKeyFilter { status }, page)
        .await?;

    Ok(Json(
        ApiResponse::success(keys).with_pagination(Pagination::new(page.page, page.limit, total)),
    ))
}

pub async fn toggle_api_key(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<Json<ApiResponse<KeyStatusChange>>> {
    toggle_scoped(&state, id, KeyScope::Any).await
}

pub async fn delete_api_key(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<Json<ApiResponse<()>>> {
    delete_scoped(&state, id, KeyScope::Any).await
}

pub async fn delete_inactive_api_keys(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<BulkDeleteResult>>> {
    let deleted = state.store.delete_inactive_api_keys().await?;
    tracing::info!("Admin {} deleted {} inactive API keys", admin.id, deleted);

    Ok(Json(
        ApiResponse::success(BulkDeleteResult { deleted })
            .with_message(format!("{} inactive API keys deleted", deleted)),
    ))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<ApiStats>>> {
    let totals = state.store.key_usage_totals().await?;
    let total_users = state.store.count_users_with_role(Role::User).await?;
    let recent_logs = state
        .store
        .list_access_logs(&LogFilter::recent(RECENT_LOG_COUNT))
        .await?;

    Ok(Json(ApiResponse::success(ApiStats::new(
        totals,
        total_users,
        recent_logs,
    ))))
}

pub async fn logs(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<LogQuery>, ApiError>,
) -> ApiResult<Json<ApiResponse<Vec<AccessLogView>>>> {
    let filter = LogFilter {
        start: parse_day("start", query.start.as_deref())?,
        end: parse_day("end", query.end.as_deref())?,
        username: query.user,
        limit: query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT),
    };

    if let (Some(start), Some(end)) = (filter.start, filter.end) {
        if start > end {
            return Err(ApiError::validation("start must not be after end"));
        }
    }

    let logs = state.store.list_access_logs(&filter).await?;
    let count = logs.len();
    Ok(Json(ApiResponse::success(logs).with_count(count)))
}

fn parse_day(field: &str, raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(day) => NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::validation(format!("{} must be a YYYY-MM-DD date", field))),
    }
}

pub async fn list_users(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<UserSummary>>>> {
    Ok(Json(ApiResponse::success(state.store.list_users().await?)))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<CreateUserRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let req = validated(req)?;

    if state
        .store
        .username_or_email_taken(&req.username, &req.email)
        .await?
    {
        return Err(ApiError::Conflict(ALREADY_REGISTERED.to_string()));
    }

    let user = state
        .store
        .create_user(NewUser {
            username: req.username,
            email: req.email,
            password_hash: hash_password(&req.password).await?,
            role: req.role.unwrap_or_default(),
        })
        .await
        .map_err(conflict_on_duplicate)?;

    tracing::info!("Admin {} created user {} as {}", admin.id, user.id, user.role);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserResponse::from(&user)).with_message("user created")),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateUserRequest>, ApiError>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let req = validated(req)?;

    let password_hash = match req.password.as_deref() {
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };
    let update = UserUpdate {
        username: req.username,
        email: req.email,
        role: req.role,
        password_hash,
    };
    if update.is_empty() {
        return Err(ApiError::validation("nothing to update"));
    }

    let user = state
        .store
        .update_user(id, update)
        .await
        .map_err(|e| match e {
            DatabaseError::NotFound => ApiError::not_found(USER_NOT_FOUND),
            other => conflict_on_duplicate(other),
        })?;

    tracing::info!("Admin {} updated user {}", admin.id, user.id);
    Ok(Json(
        ApiResponse::success(UserResponse::from(&user)).with_message("user updated"),
    ))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if id == admin.id {
        return Err(ApiError::validation("admins cannot delete their own account"));
    }

    if !state.store.delete_user(id).await? {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }

    tracing::info!("Admin {} deleted user {} and their API keys", admin.id, id);
    Ok(Json(ApiResponse::message("user deleted")))
}

fn conflict_on_duplicate(err: DatabaseError) -> ApiError {
    match err {
        DatabaseError::AlreadyExists => ApiError::Conflict(ALREADY_REGISTERED.to_string()),
        other => other.into(),
    }
}
