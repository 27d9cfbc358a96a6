//! Order lifecycle manager: validates checkout input, creates orders,
//! governs status transitions, and exposes the customer and
//! administrative query surface.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::order::{
    LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress, GUEST_OWNER,
};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::region::RegionCode;
use crate::domain::{order_number, pricing};
use crate::error::{CommerceError, Result};
use crate::messaging::EventPublisher;
use crate::notify::{EmailNotification, Notifier};
use crate::store::{OrderFilter, OrderStats, OrderStore, StoreError};

/// Bounded retries for the order-number unique-constraint backstop and
/// for conditional status updates that lose a race.
const INSERT_ATTEMPTS: usize = 3;
const CAS_ATTEMPTS: usize = 3;

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewAddress {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub city: String,
    pub state: String,
    #[validate(custom = "validate_pincode")]
    pub postal_code: String,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewOrder {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub customer_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    pub items: Vec<LineItem>,
    pub shipping_address: NewAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub owner_id: Option<String>,
}

fn validate_phone(phone: &str) -> std::result::Result<(), validator::ValidationError> {
    if phone.chars().filter(|c| c.is_ascii_digit()).count() < 10 {
        let mut err = validator::ValidationError::new("phone");
        err.message = Some("must contain at least 10 digits".into());
        return Err(err);
    }
    Ok(())
}

fn validate_pincode(code: &str) -> std::result::Result<(), validator::ValidationError> {
    let code = code.trim();
    let well_formed =
        code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) && !code.starts_with('0');
    if !well_formed {
        let mut err = validator::ValidationError::new("postal_code");
        err.message = Some("must be a 6-digit PIN code".into());
        return Err(err);
    }
    Ok(())
}

/// Picks the first failing field in declared order so the error names a
/// deterministic field regardless of hash-map iteration.
fn first_error(
    errors: &validator::ValidationErrors,
    order: &[&'static str],
) -> Option<(&'static str, String)> {
    let by_field = errors.field_errors();
    for &field in order {
        if let Some(field_errors) = by_field.get(field) {
            let reason = field_errors
                .first()
                .and_then(|e| e.message.clone())
                .map(|m| m.to_string())
                .unwrap_or_else(|| "is invalid".to_string());
            return Some((field, reason));
        }
    }
    None
}

fn store_error(err: StoreError, what: impl Into<String>) -> CommerceError {
    match err {
        StoreError::NotFound => CommerceError::NotFound(what.into()),
        other => CommerceError::Transient(other),
    }
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    notifier: Arc<dyn Notifier>,
    events: EventPublisher,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        notifier: Arc<dyn Notifier>,
        events: EventPublisher,
    ) -> Self {
        Self {
            store,
            notifier,
            events,
        }
    }

    /// All-or-nothing: any validation failure surfaces the first failing
    /// field and persists nothing.
    pub async fn create_order(&self, input: NewOrder) -> Result<Order> {
        if let Err(errors) = input.validate() {
            if let Some((field, reason)) =
                first_error(&errors, &["customer_name", "email", "phone"])
            {
                return Err(CommerceError::Validation { field, reason });
            }
        }
        let shipping_address = validated_address(&input.shipping_address)?;
        let totals = pricing::compute_totals(&input.items)?;

        let now = Utc::now();
        let mut order = Order {
            id: Uuid::now_v7(),
            order_number: order_number::generate(),
            customer_name: input.customer_name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone.trim().to_string(),
            items: input.items,
            shipping_address,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            total_amount: totals.total_amount,
            payment_method: input.payment_method,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            tracking_number: None,
            owner_id: input
                .owner_id
                .filter(|owner| !owner.trim().is_empty())
                .unwrap_or_else(|| GUEST_OWNER.to_string()),
            created_at: now,
            updated_at: now,
        };

        let mut attempt = 0;
        loop {
            match self.store.insert(&order).await {
                Ok(()) => break,
                // Order numbers can collide inside one millisecond; the
                // unique constraint catches it and we mint a fresh one.
                Err(StoreError::Duplicate) if attempt + 1 < INSERT_ATTEMPTS => {
                    attempt += 1;
                    order.order_number = order_number::generate();
                }
                Err(StoreError::Duplicate) => {
                    return Err(CommerceError::Transient(StoreError::Duplicate))
                }
                Err(err) => return Err(store_error(err, "order")),
            }
        }

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "order created"
        );
        self.events
            .publish(DomainEvent::Order(OrderEvent::Created {
                order_id: order.id,
                order_number: order.order_number.clone(),
                owner_id: order.owner_id.clone(),
                total_amount: order.total_amount,
            }))
            .await;
        self.notify(EmailNotification::order_confirmation(&order))
            .await;
        Ok(order)
    }

    /// Applies a status transition via compare-and-swap on the
    /// previously read status: of two concurrent, mutually exclusive
    /// transitions exactly one wins and the loser re-validates against
    /// the winner's result.
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
        tracking_number: Option<String>,
    ) -> Result<Order> {
        for _ in 0..CAS_ATTEMPTS {
            let current = self
                .store
                .get(id)
                .await
                .map_err(|e| store_error(e, format!("order {id}")))?;
            let from = current.status;
            if !from.can_transition_to(new_status) {
                return Err(CommerceError::InvalidTransition {
                    from,
                    to: new_status,
                });
            }
            match self
                .store
                .update_status(id, from, new_status, tracking_number.as_deref())
                .await
            {
                Ok(order) => {
                    tracing::info!(
                        order_id = %order.id,
                        from = %from,
                        to = %new_status,
                        "order status updated"
                    );
                    self.events
                        .publish(DomainEvent::Order(OrderEvent::StatusChanged {
                            order_id: order.id,
                            order_number: order.order_number.clone(),
                            from,
                            to: new_status,
                            tracking_number: order.tracking_number.clone(),
                        }))
                        .await;
                    match new_status {
                        OrderStatus::Shipped => {
                            self.notify(EmailNotification::order_shipped(&order)).await
                        }
                        OrderStatus::Cancelled => {
                            self.notify(EmailNotification::order_cancelled(&order)).await
                        }
                        _ => {}
                    }
                    return Ok(order);
                }
                Err(StoreError::Conflict) => continue,
                Err(err) => return Err(store_error(err, format!("order {id}"))),
            }
        }
        Err(CommerceError::Transient(StoreError::Conflict))
    }

    /// Payment status is an independent, unconstrained axis; any value
    /// is settable at any time.
    pub async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Order> {
        let order = self
            .store
            .update_payment_status(id, payment_status)
            .await
            .map_err(|e| store_error(e, format!("order {id}")))?;
        self.events
            .publish(DomainEvent::Order(OrderEvent::PaymentStatusChanged {
                order_id: order.id,
                payment_status,
            }))
            .await;
        Ok(order)
    }

    /// The only lookup exposed to unauthenticated customers; the order
    /// number works as a bearer credential.
    pub async fn get_by_order_number(&self, order_number: &str) -> Result<Order> {
        self.store
            .get_by_order_number(order_number)
            .await
            .map_err(|e| store_error(e, format!("order {order_number}")))
    }

    pub async fn get(&self, id: Uuid) -> Result<Order> {
        self.store
            .get(id)
            .await
            .map_err(|e| store_error(e, format!("order {id}")))
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Order>> {
        self.store
            .list_by_owner(owner_id)
            .await
            .map_err(|e| store_error(e, "orders"))
    }

    /// Administrative listing plus the unpaginated total.
    pub async fn list_all(&self, mut filter: OrderFilter) -> Result<(Vec<Order>, i64)> {
        filter.limit = filter.limit.clamp(1, 100);
        filter.offset = filter.offset.max(0);
        let orders = self
            .store
            .list(&filter)
            .await
            .map_err(|e| store_error(e, "orders"))?;
        let total = self
            .store
            .count(&filter)
            .await
            .map_err(|e| store_error(e, "orders"))?;
        Ok((orders, total))
    }

    pub async fn stats(&self) -> Result<OrderStats> {
        self.store
            .stats()
            .await
            .map_err(|e| store_error(e, "order stats"))
    }

    async fn notify(&self, notification: EmailNotification) {
        if let Err(err) = self.notifier.send(notification).await {
            tracing::warn!(error = %err, "order notification failed");
        }
    }
}

fn validated_address(address: &NewAddress) -> Result<ShippingAddress> {
    if let Err(errors) = address.validate() {
        if let Some((field, reason)) = first_error(&errors, &["line1", "city", "postal_code"]) {
            return Err(CommerceError::Validation { field, reason });
        }
    }
    let state: RegionCode = address
        .state
        .parse()
        .map_err(|e: crate::domain::region::UnknownRegion| {
            CommerceError::validation("state", e.to_string())
        })?;
    Ok(ShippingAddress {
        line1: address.line1.trim().to_string(),
        line2: address
            .line2
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToOwned::to_owned),
        city: address.city.trim().to_string(),
        state,
        postal_code: address.postal_code.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Money;
    use crate::notify::{NoopNotifier, NotifyError};
    use crate::store::MemoryOrderStore;
    use async_trait::async_trait;

    fn item(price: i64, quantity: u32) -> LineItem {
        LineItem {
            product_id: "P1".into(),
            product_name: "Saffron".into(),
            unit_price: Money::from_minor(price),
            quantity,
        }
    }

    fn address() -> NewAddress {
        NewAddress {
            line1: "12 Boulevard Road".into(),
            line2: None,
            city: "Srinagar".into(),
            state: "JK".into(),
            postal_code: "190001".into(),
        }
    }

    fn new_order(items: Vec<LineItem>) -> NewOrder {
        NewOrder {
            customer_name: "Arif Lone".into(),
            email: "arif@example.com".into(),
            phone: "9906012345".into(),
            items,
            shipping_address: address(),
            payment_method: PaymentMethod::CashOnDelivery,
            owner_id: None,
        }
    }

    fn service() -> (Arc<MemoryOrderStore>, OrderService) {
        let store = Arc::new(MemoryOrderStore::new());
        let svc = OrderService::new(
            store.clone(),
            Arc::new(NoopNotifier),
            EventPublisher::disabled(),
        );
        (store, svc)
    }

    #[tokio::test]
    async fn create_order_computes_totals_and_initial_state() {
        let (_, svc) = service();
        let order = svc
            .create_order(new_order(vec![item(500, 2), item(300, 1)]))
            .await
            .unwrap();

        assert_eq!(order.subtotal, Money::from_minor(1300));
        assert_eq!(order.tax_amount, Money::from_minor(65));
        assert_eq!(order.total_amount, Money::from_minor(1365));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.owner_id, GUEST_OWNER);
        assert!(order.order_number.starts_with("VK"));
        assert!(order.tracking_number.is_none());
    }

    #[tokio::test]
    async fn create_order_with_empty_items_persists_nothing() {
        let (store, svc) = service();
        let err = svc.create_order(new_order(vec![])).await.unwrap_err();
        assert!(matches!(
            err,
            CommerceError::Validation { field: "items", .. }
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn validation_names_the_first_failing_field() {
        let (_, svc) = service();

        let mut input = new_order(vec![item(100, 1)]);
        input.customer_name = "".into();
        input.email = "not-an-email".into();
        let err = svc.create_order(input).await.unwrap_err();
        assert!(matches!(
            err,
            CommerceError::Validation {
                field: "customer_name",
                ..
            }
        ));

        let mut input = new_order(vec![item(100, 1)]);
        input.email = "not-an-email".into();
        assert!(matches!(
            svc.create_order(input).await.unwrap_err(),
            CommerceError::Validation { field: "email", .. }
        ));

        let mut input = new_order(vec![item(100, 1)]);
        input.phone = "12345".into();
        assert!(matches!(
            svc.create_order(input).await.unwrap_err(),
            CommerceError::Validation { field: "phone", .. }
        ));

        let mut input = new_order(vec![item(100, 1)]);
        input.shipping_address.line1 = "".into();
        assert!(matches!(
            svc.create_order(input).await.unwrap_err(),
            CommerceError::Validation { field: "line1", .. }
        ));

        let mut input = new_order(vec![item(100, 1)]);
        input.shipping_address.postal_code = "01234".into();
        assert!(matches!(
            svc.create_order(input).await.unwrap_err(),
            CommerceError::Validation {
                field: "postal_code",
                ..
            }
        ));

        let mut input = new_order(vec![item(100, 1)]);
        input.shipping_address.state = "ZZ".into();
        assert!(matches!(
            svc.create_order(input).await.unwrap_err(),
            CommerceError::Validation { field: "state", .. }
        ));
    }

    #[tokio::test]
    async fn ship_from_processing_attaches_tracking() {
        let (_, svc) = service();
        let order = svc
            .create_order(new_order(vec![item(500, 1)]))
            .await
            .unwrap();
        svc.update_status(order.id, OrderStatus::Processing, None)
            .await
            .unwrap();

        let shipped = svc
            .update_status(order.id, OrderStatus::Shipped, Some("AB123".into()))
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert_eq!(shipped.tracking_number.as_deref(), Some("AB123"));
    }

    #[tokio::test]
    async fn cancelling_a_shipped_order_fails_and_changes_nothing() {
        let (_, svc) = service();
        let order = svc
            .create_order(new_order(vec![item(500, 1)]))
            .await
            .unwrap();
        svc.update_status(order.id, OrderStatus::Processing, None)
            .await
            .unwrap();
        svc.update_status(order.id, OrderStatus::Shipped, Some("AB123".into()))
            .await
            .unwrap();

        let err = svc
            .update_status(order.id, OrderStatus::Cancelled, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommerceError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Cancelled,
            }
        ));

        let unchanged = svc.get(order.id).await.unwrap();
        assert_eq!(unchanged.status, OrderStatus::Shipped);
        assert_eq!(unchanged.tracking_number.as_deref(), Some("AB123"));
    }

    #[tokio::test]
    async fn skipping_ahead_is_rejected() {
        let (_, svc) = service();
        let order = svc
            .create_order(new_order(vec![item(500, 1)]))
            .await
            .unwrap();
        let err = svc
            .update_status(order.id, OrderStatus::Delivered, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn tracking_before_shipped_is_accepted() {
        let (_, svc) = service();
        let order = svc
            .create_order(new_order(vec![item(500, 1)]))
            .await
            .unwrap();
        let updated = svc
            .update_status(order.id, OrderStatus::Processing, Some("EARLY1".into()))
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Processing);
        assert_eq!(updated.tracking_number.as_deref(), Some("EARLY1"));
    }

    #[tokio::test]
    async fn concurrent_exclusive_transitions_have_one_winner() {
        let (_, svc) = service();
        let order = svc
            .create_order(new_order(vec![item(500, 1)]))
            .await
            .unwrap();

        let a = svc.update_status(order.id, OrderStatus::Processing, None);
        let b = svc.update_status(order.id, OrderStatus::Cancelled, None);
        let (a, b) = tokio::join!(a, b);

        let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(winners, 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(
            loser.unwrap_err(),
            CommerceError::InvalidTransition { .. }
        ));
    }

    #[tokio::test]
    async fn unknown_order_number_is_not_found() {
        let (_, svc) = service();
        let err = svc
            .get_by_order_number("VK000000000000")
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_order_id_is_not_found() {
        let (_, svc) = service();
        let err = svc
            .update_status(Uuid::new_v4(), OrderStatus::Processing, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound(_)));
    }

    #[tokio::test]
    async fn payment_status_axis_is_unconstrained() {
        let (_, svc) = service();
        let order = svc
            .create_order(new_order(vec![item(500, 1)]))
            .await
            .unwrap();
        for status in [
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Pending,
            PaymentStatus::Paid,
        ] {
            let updated = svc.update_payment_status(order.id, status).await.unwrap();
            assert_eq!(updated.payment_status, status);
        }
    }

    #[tokio::test]
    async fn revenue_counts_only_paid_orders() {
        let (_, svc) = service();
        // Totals land at 105/210/315 (5% tax on 100/200/300).
        let paid_a = svc
            .create_order(new_order(vec![item(100, 1)]))
            .await
            .unwrap();
        let _pending = svc
            .create_order(new_order(vec![item(200, 1)]))
            .await
            .unwrap();
        let paid_b = svc
            .create_order(new_order(vec![item(300, 1)]))
            .await
            .unwrap();
        svc.update_payment_status(paid_a.id, PaymentStatus::Paid)
            .await
            .unwrap();
        svc.update_payment_status(paid_b.id, PaymentStatus::Paid)
            .await
            .unwrap();

        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_status[&OrderStatus::Pending], 3);
        assert_eq!(stats.total_revenue, Money::from_minor(105 + 315));
    }

    #[tokio::test]
    async fn list_by_owner_is_newest_first_and_tolerates_empty() {
        let (_, svc) = service();
        assert!(svc.list_by_owner("cust-1").await.unwrap().is_empty());

        let mut first = new_order(vec![item(100, 1)]);
        first.owner_id = Some("cust-1".into());
        let first = svc.create_order(first).await.unwrap();
        let mut second = new_order(vec![item(200, 1)]);
        second.owner_id = Some("cust-1".into());
        let second = svc.create_order(second).await.unwrap();

        let orders = svc.list_by_owner("cust-1").await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, second.id);
        assert_eq!(orders[1].id, first.id);
    }

    #[tokio::test]
    async fn list_all_filters_by_status() {
        let (_, svc) = service();
        let order = svc
            .create_order(new_order(vec![item(100, 1)]))
            .await
            .unwrap();
        svc.create_order(new_order(vec![item(200, 1)]))
            .await
            .unwrap();
        svc.update_status(order.id, OrderStatus::Processing, None)
            .await
            .unwrap();

        let (processing, total) = svc
            .list_all(OrderFilter {
                status: Some(OrderStatus::Processing),
                limit: 50,
                offset: 0,
            })
            .await
            .unwrap();
        assert_eq!(processing.len(), 1);
        assert_eq!(total, 1);
        assert_eq!(processing[0].id, order.id);
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(
            &self,
            _notification: EmailNotification,
        ) -> std::result::Result<(), NotifyError> {
            Err(NotifyError("smtp relay down".into()))
        }
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_creation() {
        let store = Arc::new(MemoryOrderStore::new());
        let svc = OrderService::new(
            store.clone(),
            Arc::new(FailingNotifier),
            EventPublisher::disabled(),
        );
        let order = svc
            .create_order(new_order(vec![item(500, 1)]))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
