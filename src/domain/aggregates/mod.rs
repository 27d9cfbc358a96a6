//! Aggregates module
pub mod cart;
pub mod order;
pub mod product;

pub use cart::{Cart, CartLine};
pub use order::{LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress};
pub use product::{Category, Product, ProductStatus};
