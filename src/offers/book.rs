//! Offer book operations.
//!
//! Numeric filtering happens in Rust on exact decimals; only the currency
//! and active-flag predicates are pushed into SQL.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::models::{Offer, OfferCreate, OfferFilter, OfferUpdate};
use crate::auth::policy::{self, Caller};
use crate::db::decimal_column;
use crate::error::ApiError;

fn map_offer(r: &SqliteRow) -> Result<Offer, ApiError> {
    Ok(Offer {
        id: r.get("id"),
        seller_id: r.get("seller_id"),
        currency: r.get("currency"),
        min_amount: decimal_column(r, "min_amount")?,
        max_amount: decimal_column(r, "max_amount")?,
        price_per_unit: decimal_column(r, "price_per_unit")?,
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
    })
}

const OFFER_COLUMNS: &str =
    "id, seller_id, currency, min_amount, max_amount, price_per_unit, is_active, created_at";

/// Outcome of a delete request.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Trades reference this offer; it was deactivated instead of removed.
    Deactivated,
}

pub struct OfferBook;

impl OfferBook {
    /// Create an offer; all numeric fields must be positive and
    /// `min_amount <= max_amount`.
    pub async fn create(
        pool: &SqlitePool,
        seller_id: i64,
        spec: OfferCreate,
    ) -> Result<Offer, ApiError> {
        validate_range(spec.min_amount, spec.max_amount, spec.price_per_unit)?;
        if spec.currency.trim().is_empty() {
            return Err(ApiError::invalid_input("currency must not be empty"));
        }

        let row = sqlx::query(&format!(
            r#"INSERT INTO offers (seller_id, currency, min_amount, max_amount, price_per_unit, is_active, created_at)
               VALUES (?, ?, ?, ?, ?, 1, ?)
               RETURNING {OFFER_COLUMNS}"#
        ))
        .bind(seller_id)
        .bind(spec.currency.trim())
        .bind(spec.min_amount.to_string())
        .bind(spec.max_amount.to_string())
        .bind(spec.price_per_unit.to_string())
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        let offer = map_offer(&row)?;
        tracing::info!(offer_id = offer.id, seller_id, "offer created");
        Ok(offer)
    }

    /// Get any offer (active or not) by id
    pub async fn get(pool: &SqlitePool, offer_id: i64) -> Result<Offer, ApiError> {
        let row = sqlx::query(&format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = ?"))
            .bind(offer_id)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::NotFound("offer"))?;

        map_offer(&row)
    }

    /// List active offers matching the filter
    pub async fn list(pool: &SqlitePool, filter: &OfferFilter) -> Result<Vec<Offer>, ApiError> {
        let rows = match &filter.currency {
            Some(currency) => {
                sqlx::query(&format!(
                    "SELECT {OFFER_COLUMNS} FROM offers WHERE is_active = 1 AND currency = ? ORDER BY id"
                ))
                .bind(currency)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {OFFER_COLUMNS} FROM offers WHERE is_active = 1 ORDER BY id"
                ))
                .fetch_all(pool)
                .await?
            }
        };

        let mut offers = Vec::with_capacity(rows.len());
        for row in &rows {
            let offer = map_offer(row)?;
            if filter.matches(&offer) {
                offers.push(offer);
            }
        }
        Ok(offers)
    }

    /// Apply a partial patch; seller or admin only. The patched offer must
    /// still satisfy the range invariant.
    pub async fn update(
        pool: &SqlitePool,
        caller: &Caller,
        offer_id: i64,
        patch: OfferUpdate,
    ) -> Result<Offer, ApiError> {
        let mut offer = Self::get(pool, offer_id).await?;
        if !policy::can_manage_offer(caller, &offer) {
            return Err(ApiError::Forbidden("not the seller of this offer"));
        }

        if let Some(currency) = patch.currency {
            if currency.trim().is_empty() {
                return Err(ApiError::invalid_input("currency must not be empty"));
            }
            offer.currency = currency.trim().to_string();
        }
        if let Some(min_amount) = patch.min_amount {
            offer.min_amount = min_amount;
        }
        if let Some(max_amount) = patch.max_amount {
            offer.max_amount = max_amount;
        }
        if let Some(price_per_unit) = patch.price_per_unit {
            offer.price_per_unit = price_per_unit;
        }
        if let Some(is_active) = patch.is_active {
            offer.is_active = is_active;
        }

        validate_range(offer.min_amount, offer.max_amount, offer.price_per_unit)?;

        sqlx::query(
            r#"UPDATE offers
               SET currency = ?, min_amount = ?, max_amount = ?, price_per_unit = ?, is_active = ?
               WHERE id = ?"#,
        )
        .bind(&offer.currency)
        .bind(offer.min_amount.to_string())
        .bind(offer.max_amount.to_string())
        .bind(offer.price_per_unit.to_string())
        .bind(offer.is_active)
        .bind(offer.id)
        .execute(pool)
        .await?;

        Ok(offer)
    }

    /// Delete an offer; seller or admin only.
    ///
    /// Offers referenced by trades are deactivated rather than removed, so
    /// trade history keeps a resolvable offer reference.
    pub async fn delete(
        pool: &SqlitePool,
        caller: &Caller,
        offer_id: i64,
    ) -> Result<DeleteOutcome, ApiError> {
        let offer = Self::get(pool, offer_id).await?;
        if !policy::can_manage_offer(caller, &offer) {
            return Err(ApiError::Forbidden("not the seller of this offer"));
        }

        let dependents: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM trades WHERE offer_id = ?")
                .bind(offer_id)
                .fetch_one(pool)
                .await?;

        if dependents > 0 {
            sqlx::query("UPDATE offers SET is_active = 0 WHERE id = ?")
                .bind(offer_id)
                .execute(pool)
                .await?;
            tracing::info!(offer_id, dependents, "offer deactivated (trades reference it)");
            return Ok(DeleteOutcome::Deactivated);
        }

        sqlx::query("DELETE FROM offers WHERE id = ?")
            .bind(offer_id)
            .execute(pool)
            .await?;
        tracing::info!(offer_id, "offer deleted");
        Ok(DeleteOutcome::Deleted)
    }
}

fn validate_range(min: Decimal, max: Decimal, price: Decimal) -> Result<(), ApiError> {
    if min <= Decimal::ZERO || max <= Decimal::ZERO || price <= Decimal::ZERO {
        return Err(ApiError::invalid_input(
            "min_amount, max_amount and price_per_unit must be positive",
        ));
    }
    if min > max {
        return Err(ApiError::invalid_input("min_amount must not exceed max_amount"));
    }
    Ok(())
}
