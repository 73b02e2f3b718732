use serde::{Deserialize, Serialize};
use std::fmt;

/// A monetary amount in minor units (cents) of a single ISO 4217 currency.
///
/// The engine never converts between currencies; amounts of different
/// currencies must not be combined, and the arithmetic helpers debug-assert
/// that callers respect this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Signed amount in minor units (e.g. cents for USD).
    pub amount_minor: i64,
    /// ISO 4217 currency code, uppercase.
    pub currency: String,
}

impl Money {
    pub fn new(amount_minor: i64, currency: impl Into<String>) -> Self {
        Self {
            amount_minor,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(0, currency)
    }

    /// Add a signed minor-unit delta (option adjustments can be negative).
    pub fn with_delta(&self, delta_minor: i64) -> Self {
        Self {
            amount_minor: self.amount_minor + delta_minor,
            currency: self.currency.clone(),
        }
    }

    /// Multiply by a line quantity.
    pub fn times(&self, quantity: u32) -> Self {
        Self {
            amount_minor: self.amount_minor * quantity as i64,
            currency: self.currency.clone(),
        }
    }

    /// Sum with another amount of the same currency.
    pub fn plus(&self, other: &Money) -> Self {
        debug_assert_eq!(self.currency, other.currency);
        Self {
            amount_minor: self.amount_minor + other.amount_minor,
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = self.amount_minor / 100;
        let minor = (self.amount_minor % 100).abs();
        write!(f, "{}.{:02} {}", major, minor, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_and_times() {
        let base = Money::new(150_000, "USD");
        let with_option = base.with_delta(-2_500);
        assert_eq!(with_option.amount_minor, 147_500);
        assert_eq!(with_option.times(3).amount_minor, 442_500);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new(120_000, "USD").to_string(), "1200.00 USD");
        assert_eq!(Money::new(99, "EUR").to_string(), "0.99 EUR");
    }
}
