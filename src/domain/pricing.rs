//! Pricing calculator: derives subtotal, tax, and total for a set of
//! line items. Pure; safe to call repeatedly and from concurrent callers.

use serde::Serialize;

use crate::domain::aggregates::order::LineItem;
use crate::domain::value_objects::Money;
use crate::error::{CommerceError, Result};

/// Flat GST-style tax rate applied to the subtotal.
pub const TAX_RATE_PERCENT: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
}

/// Computes `subtotal = Σ unit_price·quantity`, `tax_amount =
/// round_half_up(subtotal · 5%)`, `total_amount = subtotal + tax_amount`,
/// all in integer minor units. `total_amount == subtotal + tax_amount`
/// holds for every successful return.
pub fn compute_totals(items: &[LineItem]) -> Result<Totals> {
    if items.is_empty() {
        return Err(CommerceError::validation(
            "items",
            "order must contain at least one item",
        ));
    }

    let mut subtotal = Money::ZERO;
    for item in items {
        if item.unit_price.is_negative() {
            return Err(CommerceError::validation(
                "items",
                format!("negative unit price for {}", item.product_id),
            ));
        }
        if item.quantity < 1 {
            return Err(CommerceError::validation(
                "items",
                format!("zero quantity for {}", item.product_id),
            ));
        }
        let line_total = item
            .line_total()
            .ok_or_else(|| CommerceError::validation("items", "line total overflows"))?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or_else(|| CommerceError::validation("items", "subtotal overflows"))?;
    }

    let tax_amount = subtotal
        .percent_half_up(TAX_RATE_PERCENT)
        .ok_or_else(|| CommerceError::validation("items", "tax amount overflows"))?;
    let total_amount = subtotal
        .checked_add(tax_amount)
        .ok_or_else(|| CommerceError::validation("items", "total amount overflows"))?;

    Ok(Totals {
        subtotal,
        tax_amount,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, quantity: u32) -> LineItem {
        LineItem {
            product_id: "P".into(),
            product_name: "Saffron".into(),
            unit_price: Money::from_minor(price),
            quantity,
        }
    }

    #[test]
    fn totals_are_consistent_and_exact() {
        // 500 x 2 + 300 x 1 at 5% tax
        let totals = compute_totals(&[item(500, 2), item(300, 1)]).unwrap();
        assert_eq!(totals.subtotal, Money::from_minor(1300));
        assert_eq!(totals.tax_amount, Money::from_minor(65));
        assert_eq!(totals.total_amount, Money::from_minor(1365));
        assert_eq!(
            totals.total_amount,
            totals.subtotal.checked_add(totals.tax_amount).unwrap()
        );
    }

    #[test]
    fn tax_rounds_half_up() {
        // subtotal 1310 -> 65.5 tax, rounds to 66
        let totals = compute_totals(&[item(1310, 1)]).unwrap();
        assert_eq!(totals.tax_amount, Money::from_minor(66));
        assert_eq!(totals.total_amount, Money::from_minor(1376));

        // subtotal 1290 -> 64.5 tax, rounds to 65
        let totals = compute_totals(&[item(1290, 1)]).unwrap();
        assert_eq!(totals.tax_amount, Money::from_minor(65));
    }

    #[test]
    fn idempotent_for_identical_input() {
        let items = [item(999, 3), item(12345, 7)];
        let first = compute_totals(&items).unwrap();
        let second = compute_totals(&items).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_empty_items() {
        let err = compute_totals(&[]).unwrap_err();
        assert!(matches!(err, CommerceError::Validation { field: "items", .. }));
    }

    #[test]
    fn rejects_negative_price_and_zero_quantity() {
        assert!(matches!(
            compute_totals(&[item(-1, 1)]).unwrap_err(),
            CommerceError::Validation { field: "items", .. }
        ));
        assert!(matches!(
            compute_totals(&[item(100, 0)]).unwrap_err(),
            CommerceError::Validation { field: "items", .. }
        ));
    }

    #[test]
    fn rejects_overflowing_subtotal() {
        let err = compute_totals(&[item(i64::MAX, 2)]).unwrap_err();
        assert!(matches!(err, CommerceError::Validation { field: "items", .. }));
    }
}
