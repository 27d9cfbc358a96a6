//! Cart and checkout endpoints. Carts are keyed by an opaque session
//! id minted by the storefront; merge reconciles a guest session into
//! an account session at sign-in.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::cart::{Cart, CartLine};
use crate::domain::aggregates::order::Order;
use crate::domain::value_objects::Money;
use crate::service::checkout::CheckoutRequest;

use super::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub session_id: String,
    pub lines: Vec<CartLine>,
    pub subtotal: Money,
    pub item_count: usize,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        let subtotal = cart.subtotal();
        let item_count = cart.item_count();
        Self {
            session_id: cart.session_id,
            lines: cart.lines,
            subtotal,
            item_count,
        }
    }
}

pub async fn view(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    Ok(Json(state.carts.view(&session).await?.into()))
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

pub async fn add(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(request): Json<AddToCartRequest>,
) -> ApiResult<(StatusCode, Json<CartResponse>)> {
    let cart = state
        .carts
        .add_item(&session, request.product_id, request.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(cart.into())))
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

pub async fn set_quantity(
    State(state): State<AppState>,
    Path((session, product_id)): Path<(String, Uuid)>,
    Json(request): Json<SetQuantityRequest>,
) -> ApiResult<Json<CartResponse>> {
    let cart = state
        .carts
        .set_quantity(&session, product_id, request.quantity)
        .await?;
    Ok(Json(cart.into()))
}

pub async fn clear(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> ApiResult<StatusCode> {
    state.carts.clear(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub into_session: String,
}

pub async fn merge(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(request): Json<MergeRequest>,
) -> ApiResult<Json<CartResponse>> {
    let cart = state.carts.merge(&session, &request.into_session).await?;
    Ok(Json(cart.into()))
}

pub async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state.checkout.checkout(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
