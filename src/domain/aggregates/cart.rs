//! Cart aggregate: the session cart as seen by the storefront, with
//! price-resolved lines and quantity-merging add semantics.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::order::LineItem;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Cart {
    pub session_id: String,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            lines: vec![],
        }
    }

    pub fn with_lines(session_id: impl Into<String>, lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new(session_id);
        for line in lines {
            cart.add_line(line);
        }
        cart
    }

    /// Adding a product already in the cart merges quantities.
    pub fn add_line(&mut self, line: CartLine) {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.lines.push(line);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().fold(Money::ZERO, |acc, line| {
            line.line_total()
                .and_then(|t| acc.checked_add(t))
                .unwrap_or(acc)
        })
    }

    /// Order-time snapshot of the cart contents.
    pub fn to_line_items(&self) -> Vec<LineItem> {
        self.lines
            .iter()
            .map(|line| LineItem {
                product_id: line.product_id.to_string(),
                product_name: line.product_name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Uuid, quantity: u32, price: i64) -> CartLine {
        CartLine {
            product_id,
            product_name: "Saffron".into(),
            unit_price: Money::from_minor(price),
            quantity,
        }
    }

    #[test]
    fn add_merges_same_product() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new("sess-1");
        cart.add_line(line(id, 2, 1000));
        cart.add_line(line(id, 1, 1000));
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.lines[0].quantity, 3);
        assert_eq!(cart.subtotal(), Money::from_minor(3000));
    }

    #[test]
    fn snapshot_preserves_price_and_name() {
        let id = Uuid::new_v4();
        let cart = Cart::with_lines("sess-2", vec![line(id, 2, 500)]);
        let items = cart.to_line_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, id.to_string());
        assert_eq!(items[0].unit_price, Money::from_minor(500));
        assert_eq!(items[0].quantity, 2);
    }
}
