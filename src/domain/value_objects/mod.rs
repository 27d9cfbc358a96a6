//! Value objects shared across the storefront domain.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CommerceError;

/// Monetary amount in integer minor currency units (paise).
///
/// All pricing arithmetic stays in integer minor units; binary floating
/// point is never used for accumulation.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub fn minor(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// `percent`% of this amount, rounded half-up to the nearest minor
    /// unit. The widening multiply runs in i128 so it cannot overflow.
    pub fn percent_half_up(self, percent: u32) -> Option<Money> {
        let scaled = i128::from(self.0) * i128::from(percent) + 50;
        i64::try_from(scaled.div_euclid(100)).ok().map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rupees = self.0 / 100;
        let paise = (self.0 % 100).abs();
        write!(f, "₹{}.{:02}", rupees, paise)
    }
}

/// URL slug derived from a display name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    pub fn new(source: &str) -> Result<Self, CommerceError> {
        let mut slug = String::with_capacity(source.len());
        let mut last_dash = true;
        for c in source.trim().to_lowercase().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c);
                last_dash = false;
            } else if !last_dash {
                slug.push('-');
                last_dash = true;
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        if slug.is_empty() {
            return Err(CommerceError::validation(
                "name",
                "cannot derive a slug from an empty name",
            ));
        }
        Ok(Self(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_display() {
        assert_eq!(Money::from_minor(136500).to_string(), "₹1365.00");
        assert_eq!(Money::from_minor(6550).to_string(), "₹65.50");
    }

    #[test]
    fn percent_rounds_half_up() {
        // 5% of 1310 = 65.5, rounds up
        assert_eq!(
            Money::from_minor(1310).percent_half_up(5),
            Some(Money::from_minor(66))
        );
        // 5% of 1290 = 64.5, rounds up
        assert_eq!(
            Money::from_minor(1290).percent_half_up(5),
            Some(Money::from_minor(65))
        );
        // 5% of 1300 = 65 exactly
        assert_eq!(
            Money::from_minor(1300).percent_half_up(5),
            Some(Money::from_minor(65))
        );
    }

    #[test]
    fn slug_generation() {
        assert_eq!(
            Slug::new("Kashmiri Saffron  (1g)").unwrap().as_str(),
            "kashmiri-saffron-1g"
        );
        assert_eq!(Slug::new("Pashmina Shawl").unwrap().as_str(), "pashmina-shawl");
        assert!(Slug::new("  --  ").is_err());
    }
}
