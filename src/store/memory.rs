//! In-memory store implementations. They honor the same contracts as
//! the Postgres backend, including the compare-and-swap semantics of
//! `OrderStore::update_status`, so the service layer can be exercised
//! without a database.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::aggregates::order::{Order, OrderStatus, PaymentStatus};
use crate::domain::aggregates::product::{Category, Product};
use crate::domain::value_objects::Money;

use super::{
    CartEntry, CartStore, CategoryStore, OrderFilter, OrderStats, OrderStore, ProductFilter,
    ProductStore, StoreError,
};

#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<Vec<Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.lock().unwrap();
        if orders
            .iter()
            .any(|o| o.id == order.id || o.order_number == order.order_number)
        {
            return Err(StoreError::Duplicate);
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Order, StoreError> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_order_number(&self, order_number: &str) -> Result<Order, StoreError> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.order_number == order_number)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Order>, StoreError> {
        let mut out: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.owner_id == owner_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
        let mut out: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| filter.status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(usize::MAX);
        Ok(out.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, filter: &OrderFilter) -> Result<i64, StoreError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| filter.status.map_or(true, |s| o.status == s))
            .count() as i64)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new_status: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Order, StoreError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(StoreError::NotFound)?;
        if order.status != expected {
            return Err(StoreError::Conflict);
        }
        order.status = new_status;
        if let Some(tracking) = tracking_number {
            order.tracking_number = Some(tracking.to_string());
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Order, StoreError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(StoreError::NotFound)?;
        order.payment_status = payment_status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn stats(&self) -> Result<OrderStats, StoreError> {
        let orders = self.orders.lock().unwrap();
        let mut by_status: BTreeMap<OrderStatus, u64> =
            OrderStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut total_revenue = Money::ZERO;
        for order in orders.iter() {
            *by_status.entry(order.status).or_insert(0) += 1;
            if order.payment_status == PaymentStatus::Paid {
                total_revenue = total_revenue
                    .checked_add(order.total_amount)
                    .unwrap_or(total_revenue);
            }
        }
        Ok(OrderStats {
            total: orders.len() as u64,
            by_status,
            total_revenue,
        })
    }
}

#[derive(Default)]
pub struct MemoryProductStore {
    products: Mutex<Vec<Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = self.products.lock().unwrap();
        if products
            .iter()
            .any(|p| p.id == product.id || p.slug == product.slug)
        {
            return Err(StoreError::Duplicate);
        }
        products.push(product.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Product, StoreError> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Product, StoreError> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let mut out: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| matches_filter(p, filter))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(usize::MAX);
        Ok(out.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, filter: &ProductFilter) -> Result<i64, StoreError> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| matches_filter(p, filter))
            .count() as i64)
    }

    async fn update(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = self.products.lock().unwrap();
        let slot = products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(StoreError::NotFound)?;
        *slot = product.clone();
        Ok(())
    }
}

fn matches_filter(product: &Product, filter: &ProductFilter) -> bool {
    use crate::domain::aggregates::product::ProductStatus;
    if !filter.include_archived && product.status == ProductStatus::Archived {
        return false;
    }
    if let Some(category_id) = filter.category_id {
        if product.category_id != Some(category_id) {
            return false;
        }
    }
    if let Some(featured) = filter.featured {
        if product.featured != featured {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        if !product.name.to_lowercase().contains(&search.to_lowercase()) {
            return false;
        }
    }
    true
}

#[derive(Default)]
pub struct MemoryCategoryStore {
    categories: Mutex<Vec<Category>>,
}

impl MemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn insert(&self, category: &Category) -> Result<(), StoreError> {
        let mut categories = self.categories.lock().unwrap();
        if categories
            .iter()
            .any(|c| c.id == category.id || c.slug == category.slug)
        {
            return Err(StoreError::Duplicate);
        }
        categories.push(category.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Category, StoreError> {
        self.categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Category, StoreError> {
        self.categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.slug == slug)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        let mut out = self.categories.lock().unwrap().clone();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn update(&self, category: &Category) -> Result<(), StoreError> {
        let mut categories = self.categories.lock().unwrap();
        let slot = categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or(StoreError::NotFound)?;
        *slot = category.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut categories = self.categories.lock().unwrap();
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCartStore {
    entries: Mutex<Vec<CartEntry>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn add(
        &self,
        session_id: &str,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries
            .iter_mut()
            .find(|e| e.session_id == session_id && e.product_id == product_id)
        {
            entry.quantity = entry.quantity.saturating_add(quantity);
        } else {
            entries.push(CartEntry {
                session_id: session_id.to_string(),
                product_id,
                quantity,
            });
        }
        Ok(())
    }

    async fn set_quantity(
        &self,
        session_id: &str,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let position = entries
            .iter()
            .position(|e| e.session_id == session_id && e.product_id == product_id)
            .ok_or(StoreError::NotFound)?;
        if quantity == 0 {
            entries.remove(position);
        } else {
            entries[position].quantity = quantity;
        }
        Ok(())
    }

    async fn entries(&self, session_id: &str) -> Result<Vec<CartEntry>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .retain(|e| e.session_id != session_id);
        Ok(())
    }

    async fn merge_sessions(&self, from: &str, into: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let moved: Vec<CartEntry> = entries
            .iter()
            .filter(|e| e.session_id == from)
            .cloned()
            .collect();
        entries.retain(|e| e.session_id != from);
        for entry in moved {
            if let Some(existing) = entries
                .iter_mut()
                .find(|e| e.session_id == into && e.product_id == entry.product_id)
            {
                existing.quantity = existing.quantity.saturating_add(entry.quantity);
            } else {
                entries.push(CartEntry {
                    session_id: into.to_string(),
                    product_id: entry.product_id,
                    quantity: entry.quantity,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::{LineItem, PaymentMethod, ShippingAddress};
    use crate::domain::region::RegionCode;

    fn order_with(total: i64, payment_status: PaymentStatus) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            order_number: format!("VK{}{:03}", now.timestamp_millis(), total % 1000),
            customer_name: "Test Customer".into(),
            email: "customer@example.com".into(),
            phone: "9906012345".into(),
            items: vec![LineItem {
                product_id: "P1".into(),
                product_name: "Saffron".into(),
                unit_price: Money::from_minor(total),
                quantity: 1,
            }],
            shipping_address: ShippingAddress {
                line1: "12 Boulevard Road".into(),
                line2: None,
                city: "Srinagar".into(),
                state: RegionCode::Jk,
                postal_code: "190001".into(),
            },
            subtotal: Money::from_minor(total),
            tax_amount: Money::ZERO,
            total_amount: Money::from_minor(total),
            payment_method: PaymentMethod::CashOnDelivery,
            status: OrderStatus::Pending,
            payment_status,
            tracking_number: None,
            owner_id: "guest".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn revenue_excludes_unpaid_orders() {
        let store = MemoryOrderStore::new();
        store
            .insert(&order_with(100, PaymentStatus::Paid))
            .await
            .unwrap();
        store
            .insert(&order_with(200, PaymentStatus::Pending))
            .await
            .unwrap();
        store
            .insert(&order_with(300, PaymentStatus::Paid))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.total_revenue, Money::from_minor(400));
    }

    #[tokio::test]
    async fn stale_status_update_conflicts() {
        let store = MemoryOrderStore::new();
        let order = order_with(100, PaymentStatus::Pending);
        store.insert(&order).await.unwrap();
        store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Processing, None)
            .await
            .unwrap();

        // A writer still holding the pending snapshot loses.
        let err = store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn cart_merge_sums_quantities() {
        let store = MemoryCartStore::new();
        let shared = Uuid::new_v4();
        let only_guest = Uuid::new_v4();
        store.add("guest", shared, 2).await.unwrap();
        store.add("guest", only_guest, 1).await.unwrap();
        store.add("user", shared, 3).await.unwrap();

        store.merge_sessions("guest", "user").await.unwrap();

        assert!(store.entries("guest").await.unwrap().is_empty());
        let user_entries = store.entries("user").await.unwrap();
        assert_eq!(user_entries.len(), 2);
        let merged = user_entries
            .iter()
            .find(|e| e.product_id == shared)
            .unwrap();
        assert_eq!(merged.quantity, 5);
    }

    #[tokio::test]
    async fn set_quantity_zero_removes_line() {
        let store = MemoryCartStore::new();
        let product = Uuid::new_v4();
        store.add("s", product, 2).await.unwrap();
        store.set_quantity("s", product, 0).await.unwrap();
        assert!(store.entries("s").await.unwrap().is_empty());
        assert!(matches!(
            store.set_quantity("s", product, 1).await,
            Err(StoreError::NotFound)
        ));
    }
}
