//! Catalog management: products and categories.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::aggregates::product::{Category, Product};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::Money;
use crate::error::{CommerceError, Result};
use crate::messaging::EventPublisher;
use crate::store::{CategoryStore, ProductFilter, ProductStore, StoreError};

#[derive(Clone, Debug, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub compare_at_price: Option<Money>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Partial update; absent fields are left unchanged. The slug never
/// changes after creation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub compare_at_price: Option<Money>,
    pub category_id: Option<Uuid>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
    pub images: Option<Vec<String>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    categories: Arc<dyn CategoryStore>,
    events: EventPublisher,
}

impl CatalogService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        categories: Arc<dyn CategoryStore>,
        events: EventPublisher,
    ) -> Self {
        Self {
            products,
            categories,
            events,
        }
    }

    pub async fn create_product(&self, input: NewProduct) -> Result<Product> {
        let mut product =
            Product::create(input.name, input.price, input.description, input.category_id)?;
        product.compare_at_price = input.compare_at_price;
        product.stock = input.stock.max(0);
        product.featured = input.featured;
        product.images = input.images;

        match self.products.insert(&product).await {
            Ok(()) => {}
            Err(StoreError::Duplicate) => {
                return Err(CommerceError::validation(
                    "name",
                    "a product with this name already exists",
                ))
            }
            Err(err) => return Err(CommerceError::Transient(err)),
        }
        tracing::info!(product_id = %product.id, slug = %product.slug, "product created");
        self.events
            .publish(DomainEvent::Product(ProductEvent::Created {
                product_id: product.id,
                slug: product.slug.clone(),
            }))
            .await;
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, update: ProductUpdate) -> Result<Product> {
        let mut product = self.get_product(id).await?;
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(CommerceError::validation("name", "must not be empty"));
            }
            product.name = name;
        }
        if let Some(price) = update.price {
            if price.is_negative() {
                return Err(CommerceError::validation("price", "must not be negative"));
            }
            product.price = price;
        }
        if let Some(description) = update.description {
            product.description = Some(description);
        }
        if let Some(compare_at_price) = update.compare_at_price {
            product.compare_at_price = Some(compare_at_price);
        }
        if let Some(category_id) = update.category_id {
            product.category_id = Some(category_id);
        }
        if let Some(stock) = update.stock {
            product.stock = stock.max(0);
        }
        if let Some(featured) = update.featured {
            product.featured = featured;
        }
        if let Some(images) = update.images {
            product.images = images;
        }
        product.touch();

        self.products
            .update(&product)
            .await
            .map_err(|e| Self::product_error(e, id))?;
        self.events
            .publish(DomainEvent::Product(ProductEvent::Updated { product_id: id }))
            .await;
        Ok(product)
    }

    pub async fn archive_product(&self, id: Uuid) -> Result<Product> {
        let mut product = self.get_product(id).await?;
        product.archive();
        self.products
            .update(&product)
            .await
            .map_err(|e| Self::product_error(e, id))?;
        tracing::info!(product_id = %id, "product archived");
        self.events
            .publish(DomainEvent::Product(ProductEvent::Archived { product_id: id }))
            .await;
        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product> {
        self.products
            .get(id)
            .await
            .map_err(|e| Self::product_error(e, id))
    }

    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product> {
        self.products.get_by_slug(slug).await.map_err(|e| match e {
            StoreError::NotFound => CommerceError::NotFound(format!("product {slug}")),
            other => CommerceError::Transient(other),
        })
    }

    /// Storefront listing plus the total for pagination.
    pub async fn list_products(&self, mut filter: ProductFilter) -> Result<(Vec<Product>, i64)> {
        filter.limit = filter.limit.clamp(1, 100);
        filter.offset = filter.offset.max(0);
        let products = self
            .products
            .list(&filter)
            .await
            .map_err(CommerceError::Transient)?;
        let total = self
            .products
            .count(&filter)
            .await
            .map_err(CommerceError::Transient)?;
        Ok((products, total))
    }

    pub async fn create_category(&self, input: NewCategory) -> Result<Category> {
        let mut category = Category::create(input.name, input.description)?;
        category.image_url = input.image_url;
        match self.categories.insert(&category).await {
            Ok(()) => Ok(category),
            Err(StoreError::Duplicate) => Err(CommerceError::validation(
                "name",
                "a category with this name already exists",
            )),
            Err(err) => Err(CommerceError::Transient(err)),
        }
    }

    pub async fn update_category(&self, id: Uuid, input: NewCategory) -> Result<Category> {
        let mut category = self.get_category(id).await?;
        if input.name.trim().is_empty() {
            return Err(CommerceError::validation("name", "must not be empty"));
        }
        category.name = input.name;
        category.description = input.description;
        category.image_url = input.image_url;
        category.updated_at = chrono::Utc::now();
        self.categories
            .update(&category)
            .await
            .map_err(|e| Self::category_error(e, id))?;
        Ok(category)
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<()> {
        self.categories.delete(id).await.map_err(|e| match e {
            StoreError::NotFound => CommerceError::NotFound(format!("category {id}")),
            StoreError::Conflict => {
                CommerceError::validation("category", "category still has products")
            }
            other => CommerceError::Transient(other),
        })
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category> {
        self.categories
            .get(id)
            .await
            .map_err(|e| Self::category_error(e, id))
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Category> {
        self.categories.get_by_slug(slug).await.map_err(|e| match e {
            StoreError::NotFound => CommerceError::NotFound(format!("category {slug}")),
            other => CommerceError::Transient(other),
        })
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.categories
            .list()
            .await
            .map_err(CommerceError::Transient)
    }

    fn product_error(err: StoreError, id: Uuid) -> CommerceError {
        match err {
            StoreError::NotFound => CommerceError::NotFound(format!("product {id}")),
            other => CommerceError::Transient(other),
        }
    }

    fn category_error(err: StoreError, id: Uuid) -> CommerceError {
        match err {
            StoreError::NotFound => CommerceError::NotFound(format!("category {id}")),
            other => CommerceError::Transient(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryCategoryStore, MemoryProductStore};

    fn service() -> CatalogService {
        CatalogService::new(
            Arc::new(MemoryProductStore::new()),
            Arc::new(MemoryCategoryStore::new()),
            EventPublisher::disabled(),
        )
    }

    fn new_product(name: &str, price: i64) -> NewProduct {
        NewProduct {
            name: name.into(),
            description: None,
            price: Money::from_minor(price),
            compare_at_price: None,
            category_id: None,
            stock: 10,
            featured: false,
            images: vec![],
        }
    }

    #[tokio::test]
    async fn create_and_fetch_by_slug() {
        let svc = service();
        let created = svc
            .create_product(new_product("Kashmiri Kahwa Tea", 45000))
            .await
            .unwrap();
        let fetched = svc.get_product_by_slug("kashmiri-kahwa-tea").await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.price, Money::from_minor(45000));
    }

    #[tokio::test]
    async fn duplicate_name_is_a_validation_error() {
        let svc = service();
        svc.create_product(new_product("Saffron", 100000))
            .await
            .unwrap();
        let err = svc
            .create_product(new_product("Saffron", 90000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommerceError::Validation { field: "name", .. }
        ));
    }

    #[tokio::test]
    async fn archived_products_leave_the_listing_but_stay_fetchable() {
        let svc = service();
        let product = svc
            .create_product(new_product("Walnut Kernels", 80000))
            .await
            .unwrap();
        svc.archive_product(product.id).await.unwrap();

        let (listed, total) = svc.list_products(ProductFilter::default()).await.unwrap();
        assert!(listed.is_empty());
        assert_eq!(total, 0);
        // Order history still resolves the product by id.
        assert!(svc.get_product(product.id).await.is_ok());
    }

    #[tokio::test]
    async fn update_changes_fields_but_not_slug() {
        let svc = service();
        let product = svc
            .create_product(new_product("Pashmina Shawl", 1200000))
            .await
            .unwrap();
        let updated = svc
            .update_product(
                product.id,
                ProductUpdate {
                    name: Some("Pashmina Shawl (Hand-Embroidered)".into()),
                    price: Some(Money::from_minor(1500000)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.slug, "pashmina-shawl");
        assert_eq!(updated.price, Money::from_minor(1500000));
    }
}
