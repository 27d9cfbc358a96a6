//! Order endpoints: checkout-adjacent creation, customer tracking, and
//! the administrative listing/transition surface.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::aggregates::order::{Order, OrderStatus, PaymentStatus};
use crate::service::orders::NewOrder;
use crate::store::{OrderFilter, OrderStats};

use super::{page_bounds, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<OrderStatus>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewOrder>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state.orders.create_order(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PaginatedResponse<Order>>> {
    let (page, limit, offset) = page_bounds(params.page, params.per_page);
    let (orders, total) = state
        .orders
        .list_all(OrderFilter {
            status: params.status,
            limit,
            offset,
        })
        .await?;
    Ok(Json(PaginatedResponse {
        data: orders,
        total,
        page,
    }))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<OrderStats>> {
    Ok(Json(state.orders.stats().await?))
}

pub async fn track(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.get_by_order_number(&order_number).await?))
}

pub async fn list_by_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list_by_owner(&owner_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Order>> {
    let order = state
        .orders
        .update_status(id, request.status, request.tracking_number)
        .await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
}

pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePaymentRequest>,
) -> ApiResult<Json<Order>> {
    let order = state
        .orders
        .update_payment_status(id, request.payment_status)
        .await?;
    Ok(Json(order))
}
