//! Product catalog endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::aggregates::product::Product;
use crate::service::catalog::{NewProduct, ProductUpdate};
use crate::store::ProductFilter;

use super::{page_bounds, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<Uuid>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PaginatedResponse<Product>>> {
    let (page, limit, offset) = page_bounds(params.page, params.per_page);
    let (products, total) = state
        .catalog
        .list_products(ProductFilter {
            category_id: params.category,
            search: params.search,
            featured: params.featured,
            include_archived: false,
            limit,
            offset,
        })
        .await?;
    Ok(Json(PaginatedResponse {
        data: products,
        total,
        page,
    }))
}

pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.catalog.get_product_by_slug(&slug).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.catalog.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.catalog.update_product(id, update).await?))
}

pub async fn archive(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.catalog.archive_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
