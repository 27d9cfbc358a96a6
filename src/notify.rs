//! Notification collaborator: transactional emails for the order
//! lifecycle. Delivery is fire-and-forget; a failed notification is
//! logged and never rolls back or blocks the operation that sent it.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::domain::aggregates::order::Order;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    OrderConfirmation,
    OrderShipped,
    OrderCancelled,
}

impl EmailTemplate {
    pub fn name(self) -> &'static str {
        match self {
            Self::OrderConfirmation => "order_confirmation",
            Self::OrderShipped => "order_shipped",
            Self::OrderCancelled => "order_cancelled",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct EmailNotification {
    pub recipient: String,
    pub template: EmailTemplate,
    pub data: serde_json::Value,
}

impl EmailNotification {
    fn for_order(order: &Order, template: EmailTemplate) -> Self {
        let items: Vec<serde_json::Value> = order
            .items
            .iter()
            .map(|item| {
                json!({
                    "product_name": item.product_name,
                    "quantity": item.quantity,
                    "unit_price": item.unit_price,
                })
            })
            .collect();
        Self {
            recipient: order.email.clone(),
            template,
            data: json!({
                "order_number": order.order_number,
                "customer_name": order.customer_name,
                "items": items,
                "subtotal": order.subtotal,
                "tax_amount": order.tax_amount,
                "total_amount": order.total_amount,
                "shipping_address": order.shipping_address,
                "tracking_number": order.tracking_number,
            }),
        }
    }

    pub fn order_confirmation(order: &Order) -> Self {
        Self::for_order(order, EmailTemplate::OrderConfirmation)
    }

    pub fn order_shipped(order: &Order) -> Self {
        Self::for_order(order, EmailTemplate::OrderShipped)
    }

    pub fn order_cancelled(order: &Order) -> Self {
        Self::for_order(order, EmailTemplate::OrderCancelled)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: EmailNotification) -> Result<(), NotifyError>;
}

/// Publishes email jobs to NATS for an out-of-process mailer to pick up.
pub struct NatsNotifier {
    client: async_nats::Client,
}

const EMAIL_SUBJECT: &str = "vadi.notifications.email";

impl NatsNotifier {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for NatsNotifier {
    async fn send(&self, notification: EmailNotification) -> Result<(), NotifyError> {
        let payload =
            serde_json::to_vec(&notification).map_err(|e| NotifyError(e.to_string()))?;
        self.client
            .publish(EMAIL_SUBJECT, payload.into())
            .await
            .map_err(|e| NotifyError(e.to_string()))?;
        Ok(())
    }
}

/// Stand-in for deployments without a broker; logs instead of sending.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, notification: EmailNotification) -> Result<(), NotifyError> {
        tracing::debug!(
            recipient = %notification.recipient,
            template = notification.template.name(),
            "email notification skipped (no broker configured)"
        );
        Ok(())
    }
}
