use axum::{
    extract::{ConnectInfo, OriginalUri, Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::net::SocketAddr;

use crate::error::ApiError;
use crate::models::access_log::NewAccessLog;
use crate::models::api_key::ApiKey;
use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

pub const KEY_NOT_FOUND: &str = "API key not found";
pub const KEY_INVALID: &str = "API key invalid";

/// Matches the `api_logs.endpoint` column width.
const MAX_ENDPOINT_LEN: usize = 255;

/// The key that authorized the current request, as it was before this request's increment.
#[derive(Debug, Clone)]
pub struct ApiKeyContext {
    pub key: ApiKey,
    pub user_id: i64,
    pub username: String,
}

/// Gate for the public catalog. Checks run in order: header present, key exists,
/// key active, key not expired. Only then is usage recorded and the handler run.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated(KEY_NOT_FOUND.to_string()))?;

    let found = state
        .store
        .find_api_key_by_material(presented)
        .await?
        .ok_or_else(|| ApiError::InvalidCredential(KEY_INVALID.to_string()))?;

    found.key.check_usable(Utc::now()).map_err(|rejection| {
        tracing::info!("API key {} refused: {}", found.key.id, rejection);
        ApiError::Forbidden(rejection.to_string())
    })?;

    // Two separate writes; a failure between them leaves the counter ahead of the log.
    state.store.touch_api_key(found.key.id).await?;
    state
        .store
        .append_access_log(NewAccessLog {
            api_key_id: found.key.id,
            endpoint: endpoint_of(&request),
            method: request.method().as_str().to_string(),
            ip_address: request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
        })
        .await?;

    let context = ApiKeyContext {
        user_id: found.key.user_id,
        username: found.username,
        key: found.key,
    };
    tracing::debug!("API key {} authorized for user {}", context.key.id, context.user_id);
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

/// Full request path as the client sent it, before nesting stripped a prefix. Query excluded.
fn endpoint_of(request: &Request) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or_else(|| request.uri());

    truncate_chars(uri.path(), MAX_ENDPOINT_LEN)
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
