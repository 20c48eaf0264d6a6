use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use utoipa::IntoParams;

use super::resolve_page;
use crate::envelope::{ApiResponse, Pagination};
use crate::error::{ApiError, ApiResult};
use crate::middleware::ApiKeyContext;
use crate::models::shoe::Shoe;
use crate::store::ShoeFilter;
use crate::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShoeQuery {
    /// Case-insensitive substring of the brand
    pub brand: Option<String>,
    /// Exact category
    pub category: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<f64>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<f64>,
    /// 1-based, default 1
    pub page: Option<u32>,
    /// Default 10, at most 100
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Matched against brand, model and description
    pub q: Option<String>,
}

/// Paginated catalog listing
#[utoipa::path(
    get,
    path = "/api/v1/shoes",
    tag = "shoes",
    params(ShoeQuery),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "data is an array of Shoe, with pagination"),
        (status = 401, description = "Missing or unknown API key"),
        (status = 403, description = "Inactive or expired API key")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<ApiKeyContext>,
    WithRejection(Query(query), _): WithRejection<Query<ShoeQuery>, ApiError>,
) -> ApiResult<Json<ApiResponse<Vec<Shoe>>>> {
    let page = resolve_page(query.page, query.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)?;
    let filter = ShoeFilter {
        brand: query.brand,
        category: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
    };

    tracing::debug!("Key {} listing shoes with {:?}", caller.key.id, filter);
    let (shoes, total) = state.store.list_shoes(&filter, page).await?;

    Ok(Json(
        ApiResponse::success(shoes).with_pagination(Pagination::new(page.page, page.limit, total)),
    ))
}

/// Free-text search
#[utoipa::path(
    get,
    path = "/api/v1/shoes/search",
    tag = "shoes",
    params(SearchQuery),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "data is an array of Shoe, with count"),
        (status = 400, description = "q missing or blank")
    )
)]
pub async fn search(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, ApiError>,
) -> ApiResult<Json<ApiResponse<Vec<Shoe>>>> {
    let term = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::validation("search query q is required"))?;

    let shoes = state.store.search_shoes(term).await?;
    let count = shoes.len();
    Ok(Json(ApiResponse::success(shoes).with_count(count)))
}

/// One shoe by id
#[utoipa::path(
    get,
    path = "/api/v1/shoes/{id}",
    tag = "shoes",
    params(("id" = i64, Path, description = "Shoe ID")),
    security(("api_key" = [])),
    responses(
        (status = 200, description = "data is a Shoe", body = Shoe),
        (status = 404, description = "Shoe not found")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<Json<ApiResponse<Shoe>>> {
    let shoe = state
        .store
        .find_shoe(id)
        .await?
        .ok_or_else(|| ApiError::not_found("shoe not found"))?;
    Ok(Json(ApiResponse::success(shoe)))
}

/// Distinct categories, sorted
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "shoes",
    security(("api_key" = [])),
    responses((status = 200, description = "data is an array of strings"))
)]
pub async fn categories(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    Ok(Json(ApiResponse::success(state.store.shoe_categories().await?)))
}

/// Distinct brands, sorted
#[utoipa::path(
    get,
    path = "/api/v1/brands",
    tag = "shoes",
    security(("api_key" = [])),
    responses((status = 200, description = "data is an array of strings"))
)]
pub async fn brands(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    Ok(Json(ApiResponse::success(state.store.shoe_brands().await?)))
}
