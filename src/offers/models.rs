//! Data models for the offer book

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Offer row
#[derive(Debug, Clone)]
pub struct Offer {
    pub id: i64,
    pub seller_id: i64,
    pub currency: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub price_per_unit: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Public view of an offer
#[derive(Debug, Serialize, ToSchema)]
pub struct OfferData {
    pub id: i64,
    pub seller_id: i64,
    #[schema(example = "BTC")]
    pub currency: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub price_per_unit: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Offer> for OfferData {
    fn from(o: Offer) -> Self {
        Self {
            id: o.id,
            seller_id: o.seller_id,
            currency: o.currency,
            min_amount: o.min_amount,
            max_amount: o.max_amount,
            price_per_unit: o.price_per_unit,
            is_active: o.is_active,
            created_at: o.created_at,
        }
    }
}

/// New offer spec
#[derive(Debug, Deserialize, ToSchema)]
pub struct OfferCreate {
    #[schema(example = "BTC")]
    pub currency: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub price_per_unit: Decimal,
}

/// Partial patch; unset fields are left unchanged
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OfferUpdate {
    pub currency: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Listing filters; an omitted field means no constraint.
///
/// Bounds are inclusive comparisons against the stored fields
/// (`min_amount >= min_amount`, `max_amount <= max_amount`), not range
/// overlap checks.
#[derive(Debug, Default, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct OfferFilter {
    pub currency: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl OfferFilter {
    pub fn matches(&self, offer: &Offer) -> bool {
        if let Some(min_price) = self.min_price {
            if offer.price_per_unit < min_price {
                return false;
            }
        }
        if let Some(max_price) = self.max_price {
            if offer.price_per_unit > max_price {
                return false;
            }
        }
        if let Some(min_amount) = self.min_amount {
            if offer.min_amount < min_amount {
                return false;
            }
        }
        if let Some(max_amount) = self.max_amount {
            if offer.max_amount > max_amount {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn offer() -> Offer {
        Offer {
            id: 1,
            seller_id: 1,
            currency: "BTC".into(),
            min_amount: dec("1"),
            max_amount: dec("10"),
            price_per_unit: dec("100"),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_filter_matches() {
        assert!(OfferFilter::default().matches(&offer()));
    }

    #[test]
    fn test_price_bounds_inclusive() {
        let f = OfferFilter {
            min_price: Some(dec("100")),
            max_price: Some(dec("100")),
            ..Default::default()
        };
        assert!(f.matches(&offer()));

        let f = OfferFilter {
            min_price: Some(dec("100.01")),
            ..Default::default()
        };
        assert!(!f.matches(&offer()));
    }

    #[test]
    fn test_amount_bounds_compare_stored_fields() {
        // min_amount filter compares against the offer's own min_amount
        let f = OfferFilter {
            min_amount: Some(dec("1")),
            max_amount: Some(dec("10")),
            ..Default::default()
        };
        assert!(f.matches(&offer()));

        let f = OfferFilter {
            min_amount: Some(dec("2")),
            ..Default::default()
        };
        assert!(!f.matches(&offer()));
    }
}
