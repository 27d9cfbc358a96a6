//! Persistence contracts. Services depend on these traits, never on a
//! concrete backend; the Postgres implementation backs deployments and
//! the in-memory implementation backs tests and local development.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::order::{Order, OrderStatus, PaymentStatus};
use crate::domain::aggregates::product::{Category, Product};
use crate::domain::value_objects::Money;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryCartStore, MemoryCategoryStore, MemoryOrderStore, MemoryProductStore};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A conditional update lost to a concurrent writer. The caller
    /// re-reads and re-validates.
    #[error("conditional update conflict")]
    Conflict,

    /// A unique constraint (order number, slug) rejected the write.
    #[error("duplicate key")]
    Duplicate,

    #[error("storage unavailable: {0}")]
    Unavailable(Box<dyn std::error::Error + Send + Sync>),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(db) => match db.kind() {
                sqlx::error::ErrorKind::UniqueViolation => Self::Duplicate,
                sqlx::error::ErrorKind::ForeignKeyViolation => Self::Conflict,
                _ => Self::Unavailable(Box::new(sqlx::Error::Database(db))),
            },
            other => Self::Unavailable(Box::new(other)),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub include_archived: bool,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderStats {
    pub total: u64,
    pub by_status: BTreeMap<OrderStatus, u64>,
    pub total_revenue: Money,
}

/// Raw persisted cart line; the domain [`Cart`](crate::domain::aggregates::cart::Cart)
/// is built from these plus catalog lookups.
#[derive(Clone, Debug)]
pub struct CartEntry {
    pub session_id: String,
    pub product_id: Uuid,
    pub quantity: u32,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomic insert of a fully populated order.
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Order, StoreError>;

    async fn get_by_order_number(&self, order_number: &str) -> Result<Order, StoreError>;

    /// Newest first; empty is not an error.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Order>, StoreError>;

    /// Newest first, optional status filter, limit/offset pagination.
    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, StoreError>;

    /// Total matching `filter`, ignoring pagination.
    async fn count(&self, filter: &OrderFilter) -> Result<i64, StoreError>;

    /// Compare-and-swap status update: the write applies only if the
    /// stored status still equals `expected`, otherwise `Conflict`.
    /// `tracking_number` is attached when supplied.
    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new_status: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Order, StoreError>;

    async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Order, StoreError>;

    async fn stats(&self) -> Result<OrderStats, StoreError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: &Product) -> Result<(), StoreError>;
    async fn get(&self, id: Uuid) -> Result<Product, StoreError>;
    async fn get_by_slug(&self, slug: &str) -> Result<Product, StoreError>;
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError>;
    async fn count(&self, filter: &ProductFilter) -> Result<i64, StoreError>;
    async fn update(&self, product: &Product) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn insert(&self, category: &Category) -> Result<(), StoreError>;
    async fn get(&self, id: Uuid) -> Result<Category, StoreError>;
    async fn get_by_slug(&self, slug: &str) -> Result<Category, StoreError>;
    async fn list(&self) -> Result<Vec<Category>, StoreError>;
    async fn update(&self, category: &Category) -> Result<(), StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    /// Adds to a session cart; an existing line for the same product
    /// absorbs the quantity instead of duplicating the line.
    async fn add(&self, session_id: &str, product_id: Uuid, quantity: u32)
        -> Result<(), StoreError>;

    /// Sets an existing line's quantity; zero removes the line.
    async fn set_quantity(
        &self,
        session_id: &str,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<(), StoreError>;

    async fn entries(&self, session_id: &str) -> Result<Vec<CartEntry>, StoreError>;

    async fn clear(&self, session_id: &str) -> Result<(), StoreError>;

    /// Folds one session's cart into another, summing quantities on
    /// shared products, and empties the source session.
    async fn merge_sessions(&self, from: &str, into: &str) -> Result<(), StoreError>;
}
