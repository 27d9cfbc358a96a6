//! Checkout: turns a session cart into an order with order-time
//! price and name snapshots, then empties the cart.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::aggregates::order::{Order, PaymentMethod};
use crate::error::{CommerceError, Result};
use crate::service::carts::CartService;
use crate::service::orders::{NewAddress, NewOrder, OrderService};
use crate::store::{ProductStore, StoreError};

#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutRequest {
    pub session_id: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: NewAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Clone)]
pub struct CheckoutService {
    carts: CartService,
    products: Arc<dyn ProductStore>,
    orders: OrderService,
}

impl CheckoutService {
    pub fn new(
        carts: CartService,
        products: Arc<dyn ProductStore>,
        orders: OrderService,
    ) -> Self {
        Self {
            carts,
            products,
            orders,
        }
    }

    pub async fn checkout(&self, request: CheckoutRequest) -> Result<Order> {
        let cart = self.carts.view(&request.session_id).await?;
        if cart.is_empty() {
            return Err(CommerceError::validation("items", "cart is empty"));
        }
        for line in &cart.lines {
            let product = self
                .products
                .get(line.product_id)
                .await
                .map_err(|e| match e {
                    StoreError::NotFound => CommerceError::validation(
                        "items",
                        format!("{} is no longer available", line.product_name),
                    ),
                    other => CommerceError::Transient(other),
                })?;
            if !product.is_purchasable() {
                return Err(CommerceError::validation(
                    "items",
                    format!("{} is no longer available", product.name),
                ));
            }
        }

        let order = self
            .orders
            .create_order(NewOrder {
                customer_name: request.customer_name,
                email: request.email,
                phone: request.phone,
                items: cart.to_line_items(),
                shipping_address: request.shipping_address,
                payment_method: request.payment_method,
                owner_id: request.owner_id,
            })
            .await?;

        // The order exists; a cart that fails to clear is only noise.
        if let Err(err) = self.carts.clear(&request.session_id).await {
            tracing::warn!(
                session_id = %request.session_id,
                error = %err,
                "failed to clear cart after checkout"
            );
        }
        Ok(order)
    }
}
