//! HTTP surface: a thin axum layer over the services. Authentication
//! and authorization are enforced upstream; the "admin" routes are
//! marked by convention only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::CommerceError;
use crate::service::{CartService, CatalogService, CheckoutService, OrderService};

pub mod carts;
pub mod categories;
pub mod orders;
pub mod products;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub catalog: CatalogService,
    pub carts: CartService,
    pub checkout: CheckoutService,
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<CommerceError> for ApiError {
    fn from(err: CommerceError) -> Self {
        let status = match &err {
            CommerceError::Validation { .. } => StatusCode::BAD_REQUEST,
            CommerceError::InvalidTransition { .. } => StatusCode::CONFLICT,
            CommerceError::NotFound(_) => StatusCode::NOT_FOUND,
            CommerceError::Transient(cause) => {
                tracing::error!(error = %cause, "request failed on storage");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

/// Translates page/per_page query params into limit/offset.
pub(crate) fn page_bounds(page: Option<u32>, per_page: Option<u32>) -> (u32, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).min(100).max(1);
    let offset = i64::from(page - 1) * i64::from(per_page);
    (page, i64::from(per_page), offset)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "vadi-commerce" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/products",
            get(products::list).post(products::create),
        )
        .route(
            "/api/v1/products/:slug",
            get(products::get_by_slug)
                .put(products::update)
                .delete(products::archive),
        )
        .route(
            "/api/v1/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/api/v1/categories/:slug",
            get(categories::get_by_slug)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route(
            "/api/v1/cart/:session",
            get(carts::view).post(carts::add).delete(carts::clear),
        )
        .route(
            "/api/v1/cart/:session/items/:product_id",
            put(carts::set_quantity),
        )
        .route("/api/v1/cart/:session/merge", post(carts::merge))
        .route("/api/v1/checkout", post(carts::checkout))
        .route("/api/v1/orders", get(orders::list).post(orders::create))
        .route("/api/v1/orders/stats", get(orders::stats))
        .route("/api/v1/orders/track/:order_number", get(orders::track))
        .route("/api/v1/orders/user/:owner_id", get(orders::list_by_owner))
        .route("/api/v1/orders/:id/status", put(orders::update_status))
        .route("/api/v1/orders/:id/payment", put(orders::update_payment))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
