//! Trade lifecycle operations.
//!
//! A trade snapshots `price_per_unit` from its offer when it is opened and
//! computes `total_price = amount * price_per_unit` in exact decimal
//! arithmetic. The committed total never changes after creation, no matter
//! what happens to the offer later.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::models::{Trade, TradeCreate, TradeStatus, TradeUpdate};
use crate::account::UserRepository;
use crate::auth::policy::{self, Caller};
use crate::db::decimal_column;
use crate::error::ApiError;
use crate::offers::OfferBook;

fn map_trade(r: &SqliteRow) -> Result<Trade, ApiError> {
    let status_raw: String = r.get("status");
    let status = TradeStatus::parse(&status_raw)
        .ok_or_else(|| ApiError::internal(format!("corrupt trade status: {status_raw}")))?;

    Ok(Trade {
        id: r.get("id"),
        trade_id: r.get("trade_id"),
        offer_id: r.get("offer_id"),
        buyer_id: r.get("buyer_id"),
        seller_id: r.get("seller_id"),
        amount: decimal_column(r, "amount")?,
        price_per_unit: decimal_column(r, "price_per_unit")?,
        total_price: decimal_column(r, "total_price")?,
        status,
        moderator_id: r.get("moderator_id"),
        created_at: r.get("created_at"),
    })
}

const TRADE_COLUMNS: &str = "id, trade_id, offer_id, buyer_id, seller_id, amount, \
                             price_per_unit, total_price, status, moderator_id, created_at";

pub struct TradeEngine;

impl TradeEngine {
    /// Open a trade against an active offer.
    ///
    /// The requested amount must lie within the offer's inclusive
    /// `[min_amount, max_amount]` range. The public `trade_id` is a random
    /// 128-bit UUID, independent of the storage id.
    pub async fn open(
        pool: &SqlitePool,
        buyer: &Caller,
        req: TradeCreate,
    ) -> Result<Trade, ApiError> {
        let offer = OfferBook::get(pool, req.offer_id).await?;
        if !offer.is_active {
            return Err(ApiError::InactiveOffer);
        }
        if req.amount < offer.min_amount || req.amount > offer.max_amount {
            return Err(ApiError::AmountOutOfRange {
                min: offer.min_amount,
                max: offer.max_amount,
            });
        }

        let total_price = req
            .amount
            .checked_mul(offer.price_per_unit)
            .ok_or_else(|| ApiError::invalid_input("total price overflows the decimal range"))?;
        let trade_id = Uuid::new_v4().to_string();

        let row = sqlx::query(&format!(
            r#"INSERT INTO trades
               (trade_id, offer_id, buyer_id, seller_id, amount, price_per_unit, total_price, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?)
               RETURNING {TRADE_COLUMNS}"#
        ))
        .bind(&trade_id)
        .bind(offer.id)
        .bind(buyer.user_id)
        .bind(offer.seller_id)
        .bind(req.amount.to_string())
        .bind(offer.price_per_unit.to_string())
        .bind(total_price.to_string())
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        let trade = map_trade(&row)?;
        tracing::info!(
            trade_id = %trade.trade_id,
            offer_id = offer.id,
            buyer_id = buyer.user_id,
            %total_price,
            "trade opened"
        );
        Ok(trade)
    }

    /// Look up a trade by its public id without any authorization check.
    /// Callers outside this module go through [`TradeEngine::get`].
    pub(crate) async fn fetch_by_public_id(
        pool: &SqlitePool,
        trade_id: &str,
    ) -> Result<Trade, ApiError> {
        let row = sqlx::query(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades WHERE trade_id = ?"
        ))
        .bind(trade_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound("trade"))?;

        map_trade(&row)
    }

    /// Get a trade; visible to its buyer, seller, or an admin.
    pub async fn get(pool: &SqlitePool, caller: &Caller, trade_id: &str) -> Result<Trade, ApiError> {
        let trade = Self::fetch_by_public_id(pool, trade_id).await?;
        if !policy::can_access_trade(caller, &trade) {
            return Err(ApiError::Forbidden("not a party to this trade"));
        }
        Ok(trade)
    }

    /// All trades where the caller is buyer or seller.
    pub async fn list_mine(pool: &SqlitePool, caller: &Caller) -> Result<Vec<Trade>, ApiError> {
        let rows = sqlx::query(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades WHERE buyer_id = ? OR seller_id = ? ORDER BY id"
        ))
        .bind(caller.user_id)
        .bind(caller.user_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(map_trade).collect()
    }

    /// Patch status and/or moderator; buyer, seller, or admin.
    ///
    /// Status changes must follow the transition graph; anything else is
    /// rejected with `InvalidTransition` and nothing is persisted.
    pub async fn update(
        pool: &SqlitePool,
        caller: &Caller,
        trade_id: &str,
        patch: TradeUpdate,
    ) -> Result<Trade, ApiError> {
        let mut trade = Self::fetch_by_public_id(pool, trade_id).await?;
        if !policy::can_access_trade(caller, &trade) {
            return Err(ApiError::Forbidden("not a party to this trade"));
        }

        if let Some(next) = patch.status {
            trade.status.validate_transition(next)?;
            trade.status = next;
        }
        if let Some(moderator_id) = patch.moderator_id {
            if UserRepository::get_by_id(pool, moderator_id).await?.is_none() {
                return Err(ApiError::invalid_input("moderator_id: no such user"));
            }
            trade.moderator_id = Some(moderator_id);
        }

        sqlx::query("UPDATE trades SET status = ?, moderator_id = ? WHERE id = ?")
            .bind(trade.status.as_str())
            .bind(trade.moderator_id)
            .bind(trade.id)
            .execute(pool)
            .await?;

        tracing::info!(
            trade_id = %trade.trade_id,
            status = trade.status.as_str(),
            "trade updated"
        );
        Ok(trade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::UserRole;
    use crate::db::Database;
    use crate::offers::{OfferCreate, OfferUpdate};
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    async fn user(db: &Database, email: &str, name: &str, role: UserRole) -> Caller {
        let id = UserRepository::create(db.pool(), email, name, "h", role)
            .await
            .unwrap();
        Caller { user_id: id, role }
    }

    async fn btc_offer(db: &Database, seller: &Caller) -> crate::offers::Offer {
        OfferBook::create(
            db.pool(),
            seller.user_id,
            OfferCreate {
                currency: "BTC".into(),
                min_amount: dec("1"),
                max_amount: dec("10"),
                price_per_unit: dec("100"),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_snapshots_price_and_total() {
        let db = Database::connect_in_memory().await.unwrap();
        let seller = user(&db, "s@e.x", "s", UserRole::User).await;
        let buyer = user(&db, "b@e.x", "b", UserRole::User).await;
        let offer = btc_offer(&db, &seller).await;

        let trade = TradeEngine::open(
            db.pool(),
            &buyer,
            TradeCreate {
                offer_id: offer.id,
                amount: dec("5"),
            },
        )
        .await
        .unwrap();

        assert_eq!(trade.status, TradeStatus::Pending);
        assert_eq!(trade.total_price, dec("500"));
        assert_eq!(trade.price_per_unit, dec("100"));
        assert_eq!(trade.seller_id, seller.user_id);
        assert_eq!(trade.buyer_id, buyer.user_id);
        // public id is a parseable uuid, not the row id
        assert!(Uuid::parse_str(&trade.trade_id).is_ok());
    }

    #[tokio::test]
    async fn test_total_price_frozen_against_offer_edits() {
        let db = Database::connect_in_memory().await.unwrap();
        let seller = user(&db, "s@e.x", "s", UserRole::User).await;
        let buyer = user(&db, "b@e.x", "b", UserRole::User).await;
        let offer = btc_offer(&db, &seller).await;

        let trade = TradeEngine::open(
            db.pool(),
            &buyer,
            TradeCreate {
                offer_id: offer.id,
                amount: dec("5"),
            },
        )
        .await
        .unwrap();

        // seller re-prices the offer after the trade opened
        OfferBook::update(
            db.pool(),
            &seller,
            offer.id,
            OfferUpdate {
                price_per_unit: Some(dec("999")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let reloaded = TradeEngine::get(db.pool(), &buyer, &trade.trade_id)
            .await
            .unwrap();
        assert_eq!(reloaded.price_per_unit, dec("100"));
        assert_eq!(reloaded.total_price, dec("500"));
    }

    #[tokio::test]
    async fn test_open_amount_out_of_range() {
        let db = Database::connect_in_memory().await.unwrap();
        let seller = user(&db, "s@e.x", "s", UserRole::User).await;
        let buyer = user(&db, "b@e.x", "b", UserRole::User).await;
        let offer = btc_offer(&db, &seller).await;

        for amount in ["0.5", "15"] {
            let err = TradeEngine::open(
                db.pool(),
                &buyer,
                TradeCreate {
                    offer_id: offer.id,
                    amount: dec(amount),
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ApiError::AmountOutOfRange { .. }), "{amount}");
        }

        // inclusive bounds are accepted
        for amount in ["1", "10"] {
            TradeEngine::open(
                db.pool(),
                &buyer,
                TradeCreate {
                    offer_id: offer.id,
                    amount: dec(amount),
                },
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_open_inactive_offer_rejected() {
        let db = Database::connect_in_memory().await.unwrap();
        let seller = user(&db, "s@e.x", "s", UserRole::User).await;
        let buyer = user(&db, "b@e.x", "b", UserRole::User).await;
        let offer = btc_offer(&db, &seller).await;

        OfferBook::update(
            db.pool(),
            &seller,
            offer.id,
            OfferUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = TradeEngine::open(
            db.pool(),
            &buyer,
            TradeCreate {
                offer_id: offer.id,
                amount: dec("5"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InactiveOffer));
    }

    #[tokio::test]
    async fn test_open_total_overflow_rejected() {
        let db = Database::connect_in_memory().await.unwrap();
        let seller = user(&db, "s@e.x", "s", UserRole::User).await;
        let buyer = user(&db, "b@e.x", "b", UserRole::User).await;

        let offer = OfferBook::create(
            db.pool(),
            seller.user_id,
            OfferCreate {
                currency: "BTC".into(),
                min_amount: dec("1"),
                max_amount: Decimal::MAX,
                price_per_unit: Decimal::MAX,
            },
        )
        .await
        .unwrap();

        // amount * price exceeds the decimal range; must fail, not panic
        let err = TradeEngine::open(
            db.pool(),
            &buyer,
            TradeCreate {
                offer_id: offer.id,
                amount: Decimal::MAX,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_open_missing_offer() {
        let db = Database::connect_in_memory().await.unwrap();
        let buyer = user(&db, "b@e.x", "b", UserRole::User).await;

        let err = TradeEngine::open(
            db.pool(),
            &buyer,
            TradeCreate {
                offer_id: 404,
                amount: dec("5"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_visibility() {
        let db = Database::connect_in_memory().await.unwrap();
        let seller = user(&db, "s@e.x", "s", UserRole::User).await;
        let buyer = user(&db, "b@e.x", "b", UserRole::User).await;
        let stranger = user(&db, "x@e.x", "x", UserRole::User).await;
        let admin = user(&db, "a@e.x", "a", UserRole::Admin).await;
        let offer = btc_offer(&db, &seller).await;

        let trade = TradeEngine::open(
            db.pool(),
            &buyer,
            TradeCreate {
                offer_id: offer.id,
                amount: dec("2"),
            },
        )
        .await
        .unwrap();

        assert!(TradeEngine::get(db.pool(), &buyer, &trade.trade_id).await.is_ok());
        assert!(TradeEngine::get(db.pool(), &seller, &trade.trade_id).await.is_ok());
        assert!(TradeEngine::get(db.pool(), &admin, &trade.trade_id).await.is_ok());
        assert!(matches!(
            TradeEngine::get(db.pool(), &stranger, &trade.trade_id)
                .await
                .unwrap_err(),
            ApiError::Forbidden(_)
        ));

        let mine = TradeEngine::list_mine(db.pool(), &buyer).await.unwrap();
        assert_eq!(mine.len(), 1);
        let theirs = TradeEngine::list_mine(db.pool(), &stranger).await.unwrap();
        assert!(theirs.is_empty());
    }

    #[tokio::test]
    async fn test_update_enforces_transition_graph() {
        let db = Database::connect_in_memory().await.unwrap();
        let seller = user(&db, "s@e.x", "s", UserRole::User).await;
        let buyer = user(&db, "b@e.x", "b", UserRole::User).await;
        let offer = btc_offer(&db, &seller).await;

        let trade = TradeEngine::open(
            db.pool(),
            &buyer,
            TradeCreate {
                offer_id: offer.id,
                amount: dec("2"),
            },
        )
        .await
        .unwrap();

        // pending cannot jump straight to completed
        let err = TradeEngine::update(
            db.pool(),
            &buyer,
            &trade.trade_id,
            TradeUpdate {
                status: Some(TradeStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidTransition { .. }));

        // rejected transition leaves the stored status untouched
        let unchanged = TradeEngine::get(db.pool(), &buyer, &trade.trade_id)
            .await
            .unwrap();
        assert_eq!(unchanged.status, TradeStatus::Pending);

        // walk the legal forward chain
        for next in [
            TradeStatus::InProgress,
            TradeStatus::Paid,
            TradeStatus::Completed,
        ] {
            let updated = TradeEngine::update(
                db.pool(),
                &buyer,
                &trade.trade_id,
                TradeUpdate {
                    status: Some(next),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            assert_eq!(updated.status, next);
        }

        // terminal: nothing further
        let err = TradeEngine::update(
            db.pool(),
            &buyer,
            &trade.trade_id,
            TradeUpdate {
                status: Some(TradeStatus::Disputed),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_update_assigns_moderator() {
        let db = Database::connect_in_memory().await.unwrap();
        let seller = user(&db, "s@e.x", "s", UserRole::User).await;
        let buyer = user(&db, "b@e.x", "b", UserRole::User).await;
        let admin = user(&db, "a@e.x", "a", UserRole::Admin).await;
        let offer = btc_offer(&db, &seller).await;

        let trade = TradeEngine::open(
            db.pool(),
            &buyer,
            TradeCreate {
                offer_id: offer.id,
                amount: dec("2"),
            },
        )
        .await
        .unwrap();

        let updated = TradeEngine::update(
            db.pool(),
            &admin,
            &trade.trade_id,
            TradeUpdate {
                status: Some(TradeStatus::Disputed),
                moderator_id: Some(admin.user_id),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, TradeStatus::Disputed);
        assert_eq!(updated.moderator_id, Some(admin.user_id));
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_moderator() {
        let db = Database::connect_in_memory().await.unwrap();
        let seller = user(&db, "s@e.x", "s", UserRole::User).await;
        let buyer = user(&db, "b@e.x", "b", UserRole::User).await;
        let offer = btc_offer(&db, &seller).await;

        let trade = TradeEngine::open(
            db.pool(),
            &buyer,
            TradeCreate {
                offer_id: offer.id,
                amount: dec("2"),
            },
        )
        .await
        .unwrap();

        let err = TradeEngine::update(
            db.pool(),
            &buyer,
            &trade.trade_id,
            TradeUpdate {
                status: None,
                moderator_id: Some(99_999),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let unchanged = TradeEngine::get(db.pool(), &buyer, &trade.trade_id)
            .await
            .unwrap();
        assert_eq!(unchanged.moderator_id, None);
    }
}
