//! Product and category catalog entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Money, Slug};
use crate::error::{CommerceError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Archived,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    /// Stable after creation; lookups by slug are the storefront path.
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub compare_at_price: Option<Money>,
    pub category_id: Option<Uuid>,
    pub stock: i32,
    pub featured: bool,
    pub images: Vec<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn create(
        name: impl Into<String>,
        price: Money,
        description: Option<String>,
        category_id: Option<Uuid>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CommerceError::validation("name", "must not be empty"));
        }
        if price.is_negative() {
            return Err(CommerceError::validation("price", "must not be negative"));
        }
        let slug = Slug::new(&name)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            slug: slug.into_string(),
            name,
            description,
            price,
            compare_at_price: None,
            category_id,
            stock: 0,
            featured: false,
            images: vec![],
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Purchasable products are the only ones checkout will snapshot.
    pub fn is_purchasable(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Soft delete: archived products stay queryable by id so order
    /// history keeps resolving.
    pub fn archive(&mut self) {
        self.status = ProductStatus::Archived;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn create(name: impl Into<String>, description: Option<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CommerceError::validation("name", "must not be empty"));
        }
        let slug = Slug::new(&name)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            slug: slug.into_string(),
            name,
            description,
            image_url: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_derives_slug() {
        let p = Product::create("Kashmiri Kahwa Tea", Money::from_minor(45000), None, None).unwrap();
        assert_eq!(p.slug, "kashmiri-kahwa-tea");
        assert!(p.is_purchasable());
    }

    #[test]
    fn archive_blocks_purchase() {
        let mut p = Product::create("Walnut Kernels", Money::from_minor(80000), None, None).unwrap();
        p.archive();
        assert!(!p.is_purchasable());
        assert_eq!(p.status, ProductStatus::Archived);
    }

    #[test]
    fn create_rejects_blank_name_and_negative_price() {
        assert!(Product::create("   ", Money::from_minor(100), None, None).is_err());
        assert!(Product::create("Shawl", Money::from_minor(-1), None, None).is_err());
    }
}
