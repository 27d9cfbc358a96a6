//! Session carts: price-resolved views, line edits, and the guest-cart
//! to account-cart merge performed at sign-in.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::aggregates::cart::{Cart, CartLine};
use crate::error::{CommerceError, Result};
use crate::store::{CartStore, ProductStore, StoreError};

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    products: Arc<dyn ProductStore>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, products: Arc<dyn ProductStore>) -> Self {
        Self { carts, products }
    }

    pub async fn add_item(
        &self,
        session_id: &str,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<Cart> {
        if quantity == 0 {
            return Err(CommerceError::validation("quantity", "must be at least 1"));
        }
        let product = self.products.get(product_id).await.map_err(|e| match e {
            StoreError::NotFound => CommerceError::NotFound(format!("product {product_id}")),
            other => CommerceError::Transient(other),
        })?;
        if !product.is_purchasable() {
            return Err(CommerceError::validation(
                "product_id",
                "product is no longer available",
            ));
        }
        self.carts
            .add(session_id, product_id, quantity)
            .await
            .map_err(CommerceError::Transient)?;
        self.view(session_id).await
    }

    pub async fn set_quantity(
        &self,
        session_id: &str,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<Cart> {
        self.carts
            .set_quantity(session_id, product_id, quantity)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => {
                    CommerceError::NotFound(format!("cart line for product {product_id}"))
                }
                other => CommerceError::Transient(other),
            })?;
        self.view(session_id).await
    }

    /// The cart as the storefront renders it: persisted lines joined
    /// with current catalog names and prices. Lines whose product has
    /// vanished are dropped rather than failing the whole view.
    pub async fn view(&self, session_id: &str) -> Result<Cart> {
        let entries = self
            .carts
            .entries(session_id)
            .await
            .map_err(CommerceError::Transient)?;
        let mut cart = Cart::new(session_id);
        for entry in entries {
            match self.products.get(entry.product_id).await {
                Ok(product) => cart.add_line(CartLine {
                    product_id: product.id,
                    product_name: product.name,
                    unit_price: product.price,
                    quantity: entry.quantity,
                }),
                Err(StoreError::NotFound) => {
                    tracing::warn!(
                        session_id,
                        product_id = %entry.product_id,
                        "dropping cart line for missing product"
                    );
                }
                Err(other) => return Err(CommerceError::Transient(other)),
            }
        }
        Ok(cart)
    }

    pub async fn clear(&self, session_id: &str) -> Result<()> {
        self.carts
            .clear(session_id)
            .await
            .map_err(CommerceError::Transient)
    }

    /// Reconciles a guest session's cart into an account session after
    /// sign-in: shared products sum their quantities, everything else
    /// carries over, and the guest session empties.
    pub async fn merge(&self, from_session: &str, into_session: &str) -> Result<Cart> {
        self.carts
            .merge_sessions(from_session, into_session)
            .await
            .map_err(CommerceError::Transient)?;
        self.view(into_session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Money;
    use crate::service::catalog::NewProduct;
    use crate::service::CatalogService;
    use crate::store::{MemoryCartStore, MemoryCategoryStore, MemoryProductStore};
    use crate::messaging::EventPublisher;

    async fn setup() -> (CartService, CatalogService) {
        let products = Arc::new(MemoryProductStore::new());
        let catalog = CatalogService::new(
            products.clone(),
            Arc::new(MemoryCategoryStore::new()),
            EventPublisher::disabled(),
        );
        let carts = CartService::new(Arc::new(MemoryCartStore::new()), products);
        (carts, catalog)
    }

    fn product(name: &str, price: i64) -> NewProduct {
        NewProduct {
            name: name.into(),
            description: None,
            price: Money::from_minor(price),
            compare_at_price: None,
            category_id: None,
            stock: 5,
            featured: false,
            images: vec![],
        }
    }

    #[tokio::test]
    async fn add_resolves_price_and_merges_lines() {
        let (carts, catalog) = setup().await;
        let saffron = catalog.create_product(product("Saffron", 1000)).await.unwrap();

        carts.add_item("sess", saffron.id, 2).await.unwrap();
        let cart = carts.add_item("sess", saffron.id, 1).await.unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.lines[0].quantity, 3);
        assert_eq!(cart.subtotal(), Money::from_minor(3000));
    }

    #[tokio::test]
    async fn archived_products_cannot_be_added() {
        let (carts, catalog) = setup().await;
        let shawl = catalog.create_product(product("Shawl", 5000)).await.unwrap();
        catalog.archive_product(shawl.id).await.unwrap();

        let err = carts.add_item("sess", shawl.id, 1).await.unwrap_err();
        assert!(matches!(err, CommerceError::Validation { .. }));
    }

    #[tokio::test]
    async fn merge_combines_guest_and_account_sessions() {
        let (carts, catalog) = setup().await;
        let tea = catalog.create_product(product("Kahwa", 45000)).await.unwrap();
        let honey = catalog.create_product(product("Honey", 60000)).await.unwrap();

        carts.add_item("guest-abc", tea.id, 2).await.unwrap();
        carts.add_item("guest-abc", honey.id, 1).await.unwrap();
        carts.add_item("user-42", tea.id, 1).await.unwrap();

        let merged = carts.merge("guest-abc", "user-42").await.unwrap();
        assert_eq!(merged.item_count(), 2);
        let tea_line = merged
            .lines
            .iter()
            .find(|l| l.product_id == tea.id)
            .unwrap();
        assert_eq!(tea_line.quantity, 3);
        assert!(carts.view("guest-abc").await.unwrap().is_empty());
    }
}
