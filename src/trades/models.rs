//! Trade data models and the status state machine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

/// Trade lifecycle status.
///
/// Forward chain: `pending -> in_progress -> paid -> completed`.
/// `disputed` and `cancelled` are reachable from any non-terminal state;
/// a dispute resolves to `completed` or `cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Pending,
    InProgress,
    Paid,
    Completed,
    Disputed,
    Cancelled,
}

impl TradeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeStatus::Pending => "pending",
            TradeStatus::InProgress => "in_progress",
            TradeStatus::Paid => "paid",
            TradeStatus::Completed => "completed",
            TradeStatus::Disputed => "disputed",
            TradeStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TradeStatus::Pending),
            "in_progress" => Some(TradeStatus::InProgress),
            "paid" => Some(TradeStatus::Paid),
            "completed" => Some(TradeStatus::Completed),
            "disputed" => Some(TradeStatus::Disputed),
            "cancelled" => Some(TradeStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TradeStatus::Completed | TradeStatus::Cancelled)
    }

    /// Whether `next` is a legal successor. Re-asserting the current status
    /// is an idempotent no-op and always allowed.
    pub fn can_transition_to(self, next: TradeStatus) -> bool {
        use TradeStatus::*;

        if self == next {
            return true;
        }
        match (self, next) {
            (Pending, InProgress) => true,
            (InProgress, Paid) => true,
            (Paid, Completed) => true,
            // side branches from any non-terminal state
            (Pending | InProgress | Paid, Disputed | Cancelled) => true,
            // dispute resolution
            (Disputed, Completed | Cancelled) => true,
            _ => false,
        }
    }

    pub fn validate_transition(self, next: TradeStatus) -> Result<(), ApiError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(ApiError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

/// Trade row.
///
/// `price_per_unit` and `total_price` are snapshotted from the offer at
/// creation and never change afterwards; `trade_id` is the public opaque
/// handle, distinct from the storage id.
#[derive(Debug, Clone)]
pub struct Trade {
    pub id: i64,
    pub trade_id: String,
    pub offer_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub amount: Decimal,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
    pub status: TradeStatus,
    pub moderator_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Public view of a trade
#[derive(Debug, Serialize, ToSchema)]
pub struct TradeData {
    pub trade_id: String,
    pub offer_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub amount: Decimal,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
    pub status: TradeStatus,
    pub moderator_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Trade> for TradeData {
    fn from(t: Trade) -> Self {
        Self {
            trade_id: t.trade_id,
            offer_id: t.offer_id,
            buyer_id: t.buyer_id,
            seller_id: t.seller_id,
            amount: t.amount,
            price_per_unit: t.price_per_unit,
            total_price: t.total_price,
            status: t.status,
            moderator_id: t.moderator_id,
            created_at: t.created_at,
        }
    }
}

/// Open a trade against an offer
#[derive(Debug, Deserialize, ToSchema)]
pub struct TradeCreate {
    pub offer_id: i64,
    pub amount: Decimal,
}

/// Patch status and/or moderator assignment
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TradeUpdate {
    pub status: Option<TradeStatus>,
    pub moderator_id: Option<i64>,
}

/// Message row in a trade thread
#[derive(Debug, Clone)]
pub struct TradeMessage {
    pub id: i64,
    pub trade_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of a trade message
#[derive(Debug, Serialize, ToSchema)]
pub struct TradeMessageData {
    pub id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<TradeMessage> for TradeMessageData {
    fn from(m: TradeMessage) -> Self {
        Self {
            id: m.id,
            sender_id: m.sender_id,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TradeMessageCreate {
    pub content: String,
}
