//! Per-trade message threads, gated by trade participancy.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::engine::TradeEngine;
use super::models::TradeMessage;
use crate::auth::policy::{self, Caller};
use crate::error::ApiError;

fn map_message(r: &SqliteRow) -> TradeMessage {
    TradeMessage {
        id: r.get("id"),
        trade_id: r.get("trade_id"),
        sender_id: r.get("sender_id"),
        content: r.get("content"),
        created_at: r.get("created_at"),
    }
}

pub struct Messaging;

impl Messaging {
    /// Append a message to a trade's thread; buyer or seller only.
    pub async fn post(
        pool: &SqlitePool,
        caller: &Caller,
        trade_id: &str,
        content: String,
    ) -> Result<TradeMessage, ApiError> {
        if content.trim().is_empty() {
            return Err(ApiError::invalid_input("message content must not be empty"));
        }

        let trade = TradeEngine::fetch_by_public_id(pool, trade_id).await?;
        if !policy::can_message_trade(caller, &trade) {
            return Err(ApiError::Forbidden("not a party to this trade"));
        }

        let row = sqlx::query(
            r#"INSERT INTO trade_messages (trade_id, sender_id, content, created_at)
               VALUES (?, ?, ?, ?)
               RETURNING id, trade_id, sender_id, content, created_at"#,
        )
        .bind(trade.id)
        .bind(caller.user_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(map_message(&row))
    }

    /// List a trade's messages in creation order; buyer or seller only.
    pub async fn list(
        pool: &SqlitePool,
        caller: &Caller,
        trade_id: &str,
    ) -> Result<Vec<TradeMessage>, ApiError> {
        let trade = TradeEngine::fetch_by_public_id(pool, trade_id).await?;
        if !policy::can_message_trade(caller, &trade) {
            return Err(ApiError::Forbidden("not a party to this trade"));
        }

        let rows = sqlx::query(
            r#"SELECT id, trade_id, sender_id, content, created_at
               FROM trade_messages WHERE trade_id = ? ORDER BY id"#,
        )
        .bind(trade.id)
        .fetch_all(pool)
        .await?;

        Ok(rows.iter().map(map_message).collect())
    }
}
