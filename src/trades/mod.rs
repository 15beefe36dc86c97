//! Trade engine: opening trades against offers, the status state machine,
//! and the per-trade message thread.

pub mod engine;
pub mod handlers;
pub mod messages;
pub mod models;

pub use engine::TradeEngine;
pub use messages::Messaging;
pub use models::{
    Trade, TradeCreate, TradeData, TradeMessage, TradeMessageCreate, TradeMessageData,
    TradeStatus, TradeUpdate,
};
