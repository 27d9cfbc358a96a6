//! Postgres-backed stores. Single-row inserts keep order creation
//! atomic; status updates are conditional on the previously read status
//! so concurrent transitions on one order serialize.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::aggregates::order::{
    LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress,
};
use crate::domain::aggregates::product::{Category, Product};
use crate::domain::value_objects::Money;

use super::{
    CartEntry, CartStore, CategoryStore, OrderFilter, OrderStats, OrderStore, ProductFilter,
    ProductStore, StoreError,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_name: String,
    email: String,
    phone: String,
    items: Json<Vec<LineItem>>,
    shipping_address: Json<ShippingAddress>,
    subtotal: Money,
    tax_amount: Money,
    total_amount: Money,
    payment_method: PaymentMethod,
    status: OrderStatus,
    payment_status: PaymentStatus,
    tracking_number: Option<String>,
    owner_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            customer_name: row.customer_name,
            email: row.email,
            phone: row.phone,
            items: row.items.0,
            shipping_address: row.shipping_address.0,
            subtotal: row.subtotal,
            tax_amount: row.tax_amount,
            total_amount: row.total_amount,
            payment_method: row.payment_method,
            status: row.status,
            payment_status: row.payment_status,
            tracking_number: row.tracking_number,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO orders (id, order_number, customer_name, email, phone, items, \
             shipping_address, subtotal, tax_amount, total_amount, payment_method, status, \
             payment_status, tracking_number, owner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(&order.customer_name)
        .bind(&order.email)
        .bind(&order.phone)
        .bind(Json(&order.items))
        .bind(Json(&order.shipping_address))
        .bind(order.subtotal)
        .bind(order.tax_amount)
        .bind(order.total_amount)
        .bind(order.payment_method)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(&order.tracking_number)
        .bind(&order.owner_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn get_by_order_number(&self, order_number: &str) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE order_number = $1")
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
        let rows = if let Some(status) = filter.status {
            sqlx::query_as::<_, OrderRow>(
                "SELECT * FROM orders WHERE status = $1 ORDER BY created_at DESC \
                 LIMIT $2 OFFSET $3",
            )
            .bind(status)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, OrderRow>(
                "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            )
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn count(&self, filter: &OrderFilter) -> Result<i64, StoreError> {
        let count = if let Some(status) = filter.status {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE status = $1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
                .fetch_one(&self.pool)
                .await?
        };
        Ok(count)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new_status: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Order, StoreError> {
        // The status predicate is the compare-and-swap: zero rows means
        // either a concurrent writer won or the order is gone, and the
        // caller re-reads to find out which.
        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = $3, \
             tracking_number = COALESCE($4, tracking_number), updated_at = NOW() \
             WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(id)
        .bind(expected)
        .bind(new_status)
        .bind(tracking_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::Conflict)?;
        Ok(row.into())
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET payment_status = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payment_status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn stats(&self) -> Result<OrderStats, StoreError> {
        let counts = sqlx::query_as::<_, (OrderStatus, i64)>(
            "SELECT status, COUNT(*) FROM orders GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let revenue = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders \
             WHERE payment_status = 'paid'",
        )
        .fetch_one(&self.pool)
        .await?;

        let mut by_status: BTreeMap<OrderStatus, u64> =
            OrderStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut total = 0u64;
        for (status, count) in counts {
            let count = count.max(0) as u64;
            by_status.insert(status, count);
            total += count;
        }

        Ok(OrderStats {
            total,
            by_status,
            total_revenue: Money::from_minor(revenue),
        })
    }
}

fn push_product_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if !filter.include_archived {
        builder.push(" AND status = 'active'");
    }
    if let Some(category_id) = filter.category_id {
        builder.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(featured) = filter.featured {
        builder.push(" AND featured = ").push_bind(featured);
    }
    if let Some(search) = &filter.search {
        builder
            .push(" AND name ILIKE ")
            .push_bind(format!("%{}%", search));
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO products (id, slug, name, description, price, compare_at_price, \
             category_id, stock, featured, images, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(product.id)
        .bind(&product.slug)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.compare_at_price)
        .bind(product.category_id)
        .bind(product.stock)
        .bind(product.featured)
        .bind(&product.images)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Product, StoreError> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Product, StoreError> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE slug = $1 AND status != 'archived'",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let mut builder = QueryBuilder::new("SELECT * FROM products WHERE 1=1");
        push_product_filter(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);
        let products = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn count(&self, filter: &ProductFilter) -> Result<i64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM products WHERE 1=1");
        push_product_filter(&mut builder, filter);
        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update(&self, product: &Product) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "UPDATE products SET name = $2, description = $3, price = $4, \
             compare_at_price = $5, category_id = $6, stock = $7, featured = $8, \
             images = $9, status = $10, updated_at = $11 WHERE id = $1",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.compare_at_price)
        .bind(product.category_id)
        .bind(product.stock)
        .bind(product.featured)
        .bind(&product.images)
        .bind(product.status)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn insert(&self, category: &Category) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO categories (id, slug, name, description, image_url, created_at, \
             updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(category.id)
        .bind(&category.slug)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.image_url)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Category, StoreError> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Category, StoreError> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn update(&self, category: &Category) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "UPDATE categories SET name = $2, description = $3, image_url = $4, \
             updated_at = $5 WHERE id = $1",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.image_url)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn add(
        &self,
        session_id: &str,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO cart_items (id, session_id, product_id, quantity, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (session_id, product_id) \
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
        )
        .bind(Uuid::now_v7())
        .bind(session_id)
        .bind(product_id)
        .bind(quantity as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_quantity(
        &self,
        session_id: &str,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let result = if quantity == 0 {
            sqlx::query("DELETE FROM cart_items WHERE session_id = $1 AND product_id = $2")
                .bind(session_id)
                .bind(product_id)
                .execute(&self.pool)
                .await?
        } else {
            sqlx::query(
                "UPDATE cart_items SET quantity = $3 \
                 WHERE session_id = $1 AND product_id = $2",
            )
            .bind(session_id)
            .bind(product_id)
            .bind(quantity as i32)
            .execute(&self.pool)
            .await?
        };
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn entries(&self, session_id: &str) -> Result<Vec<CartEntry>, StoreError> {
        let rows = sqlx::query_as::<_, (String, Uuid, i32)>(
            "SELECT session_id, product_id, quantity FROM cart_items \
             WHERE session_id = $1 ORDER BY created_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(session_id, product_id, quantity)| CartEntry {
                session_id,
                product_id,
                quantity: quantity.max(0) as u32,
            })
            .collect())
    }

    async fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cart_items WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn merge_sessions(&self, from: &str, into: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO cart_items (id, session_id, product_id, quantity, created_at) \
             SELECT gen_random_uuid(), $2, product_id, quantity, NOW() \
             FROM cart_items WHERE session_id = $1 \
             ON CONFLICT (session_id, product_id) \
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
        )
        .bind(from)
        .bind(into)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM cart_items WHERE session_id = $1")
            .bind(from)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
