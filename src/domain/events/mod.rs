//! Domain events published to the message broker.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::order::{OrderStatus, PaymentStatus};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Order(OrderEvent),
    Product(ProductEvent),
}

impl DomainEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Created { .. }) => "vadi.orders.created",
            Self::Order(OrderEvent::StatusChanged { .. }) => "vadi.orders.status_changed",
            Self::Order(OrderEvent::PaymentStatusChanged { .. }) => "vadi.orders.payment_changed",
            Self::Product(ProductEvent::Created { .. }) => "vadi.catalog.product_created",
            Self::Product(ProductEvent::Updated { .. }) => "vadi.catalog.product_updated",
            Self::Product(ProductEvent::Archived { .. }) => "vadi.catalog.product_archived",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Created {
        order_id: Uuid,
        order_number: String,
        owner_id: String,
        total_amount: Money,
    },
    StatusChanged {
        order_id: Uuid,
        order_number: String,
        from: OrderStatus,
        to: OrderStatus,
        tracking_number: Option<String>,
    },
    PaymentStatusChanged {
        order_id: Uuid,
        payment_status: PaymentStatus,
    },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: Uuid, slug: String },
    Updated { product_id: Uuid },
    Archived { product_id: Uuid },
}
