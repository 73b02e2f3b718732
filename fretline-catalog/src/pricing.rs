use crate::repository::PriceRepository;
use chrono::{DateTime, Utc};
use fretline_core::{Principal, StoreError};
use fretline_shared::Money;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromoKind {
    /// Flat discount in minor units.
    AmountOff,
    /// Discount in basis points of the resolved price (1000 = 10%).
    PercentOff,
}

/// A time-bounded promotion on a price record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promo {
    pub kind: PromoKind,
    pub amount: i64,
    pub valid_until: DateTime<Utc>,
}

impl Promo {
    fn is_active(&self, as_of: DateTime<Utc>) -> bool {
        self.valid_until >= as_of
    }

    /// Apply the discount to a minor-unit price, flooring at zero.
    fn apply(&self, price_minor: i64) -> i64 {
        let discounted = match self.kind {
            PromoKind::AmountOff => price_minor - self.amount,
            PromoKind::PercentOff => price_minor - price_minor * self.amount / 10_000,
        };
        discounted.max(0)
    }
}

/// Authoritative pricing for one (item, currency) pair. Multi-currency
/// items carry one record per currency; the engine never converts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub item_id: Uuid,
    /// ISO 4217 currency code every amount in this record is expressed in.
    pub currency: String,
    pub base_price_minor: i64,
    /// tier id -> tier price.
    pub tier_prices: HashMap<String, i64>,
    /// account id -> negotiated override price.
    pub account_overrides: HashMap<Uuid, i64>,
    pub promo: Option<Promo>,
}

impl PriceRecord {
    /// Resolve the unit price for `principal` as of `as_of`.
    ///
    /// Precedence: an account override wins outright (promos do not stack
    /// on a negotiated price); otherwise the tier price, else the base
    /// price, with an active promo applied as a discount on the result.
    pub fn resolve(
        &self,
        principal: &Principal,
        as_of: DateTime<Utc>,
    ) -> Result<Money, PricingError> {
        if let Some(&override_price) = self.account_overrides.get(&principal.account_id) {
            return Ok(Money::new(override_price, self.currency.as_str()));
        }

        // Without an override in the requested currency the account must
        // already transact in it; conversion is out of scope.
        if principal.currency != self.currency {
            return Err(PricingError::CurrencyMismatch {
                account_currency: principal.currency.clone(),
                requested: self.currency.clone(),
            });
        }

        let mut price = principal
            .tier_id
            .as_deref()
            .and_then(|tier| self.tier_prices.get(tier))
            .copied()
            .unwrap_or(self.base_price_minor);

        if let Some(promo) = &self.promo {
            if promo.is_active(as_of) {
                price = promo.apply(price);
            }
        }

        Ok(Money::new(price, self.currency.as_str()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("no price record for item {item_id} in {currency}")]
    PriceNotFound { item_id: Uuid, currency: String },

    #[error("account transacts in {account_currency}, requested {requested}, no override present")]
    CurrencyMismatch {
        account_currency: String,
        requested: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Repository-backed price resolution. Side-effect free and safe to call
/// repeatedly and concurrently; all state lives in the price records.
#[derive(Clone)]
pub struct PriceResolver {
    prices: Arc<dyn PriceRepository>,
}

impl PriceResolver {
    pub fn new(prices: Arc<dyn PriceRepository>) -> Self {
        Self { prices }
    }

    pub async fn resolve(
        &self,
        item_id: Uuid,
        principal: &Principal,
        currency: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Money, PricingError> {
        let record = self
            .prices
            .price_record(item_id, currency)
            .await?
            .ok_or_else(|| PricingError::PriceNotFound {
                item_id,
                currency: currency.to_string(),
            })?;
        record.resolve(principal, as_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fretline_core::Role;

    fn record(item_id: Uuid) -> PriceRecord {
        PriceRecord {
            item_id,
            currency: "USD".to_string(),
            base_price_minor: 150_000,
            tier_prices: HashMap::from([("TIER_A".to_string(), 120_000)]),
            account_overrides: HashMap::new(),
            promo: None,
        }
    }

    fn dealer(tier: Option<&str>, currency: &str) -> Principal {
        Principal {
            account_id: Uuid::new_v4(),
            role: Role::Dealer,
            tier_id: tier.map(|t| t.to_string()),
            currency: currency.to_string(),
        }
    }

    #[test]
    fn test_tier_price_beats_base() {
        // basePrice 1500 USD, TIER_A 1200, no override, no promo -> 1200.
        let record = record(Uuid::new_v4());
        let price = record
            .resolve(&dealer(Some("TIER_A"), "USD"), Utc::now())
            .unwrap();
        assert_eq!(price, Money::new(120_000, "USD"));
    }

    #[test]
    fn test_base_price_when_tier_unknown() {
        let record = record(Uuid::new_v4());
        let price = record
            .resolve(&dealer(Some("TIER_Z"), "USD"), Utc::now())
            .unwrap();
        assert_eq!(price.amount_minor, 150_000);
    }

    #[test]
    fn test_override_wins_over_tier_promo_and_base() {
        let mut rec = record(Uuid::new_v4());
        let principal = dealer(Some("TIER_A"), "USD");
        rec.account_overrides
            .insert(principal.account_id, 100_000);
        rec.promo = Some(Promo {
            kind: PromoKind::PercentOff,
            amount: 5_000,
            valid_until: Utc::now() + Duration::days(7),
        });
        let price = rec.resolve(&principal, Utc::now()).unwrap();
        assert_eq!(price.amount_minor, 100_000);
    }

    #[test]
    fn test_active_promo_discounts_tier_price() {
        let mut rec = record(Uuid::new_v4());
        rec.promo = Some(Promo {
            kind: PromoKind::AmountOff,
            amount: 10_000,
            valid_until: Utc::now() + Duration::days(1),
        });
        let price = rec
            .resolve(&dealer(Some("TIER_A"), "USD"), Utc::now())
            .unwrap();
        assert_eq!(price.amount_minor, 110_000);
    }

    #[test]
    fn test_expired_promo_is_ignored() {
        let mut rec = record(Uuid::new_v4());
        rec.promo = Some(Promo {
            kind: PromoKind::AmountOff,
            amount: 10_000,
            valid_until: Utc::now() - Duration::days(1),
        });
        let price = rec.resolve(&dealer(None, "USD"), Utc::now()).unwrap();
        assert_eq!(price.amount_minor, 150_000);
    }

    #[test]
    fn test_currency_mismatch_without_override() {
        let rec = record(Uuid::new_v4());
        let err = rec
            .resolve(&dealer(Some("TIER_A"), "EUR"), Utc::now())
            .unwrap_err();
        assert!(matches!(err, PricingError::CurrencyMismatch { .. }));
    }

    #[test]
    fn test_override_satisfies_foreign_currency_account() {
        let mut rec = record(Uuid::new_v4());
        let principal = dealer(None, "EUR");
        rec.account_overrides.insert(principal.account_id, 95_000);
        let price = rec.resolve(&principal, Utc::now()).unwrap();
        assert_eq!(price, Money::new(95_000, "USD"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let rec = record(Uuid::new_v4());
        let principal = dealer(Some("TIER_A"), "USD");
        let as_of = Utc::now();
        let first = rec.resolve(&principal, as_of).unwrap();
        let second = rec.resolve(&principal, as_of).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_promo_never_drives_price_negative() {
        let promo = Promo {
            kind: PromoKind::AmountOff,
            amount: 200_000,
            valid_until: Utc::now() + Duration::days(1),
        };
        assert_eq!(promo.apply(150_000), 0);
    }
}
