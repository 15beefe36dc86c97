//! NexusSwap - Peer-to-peer cryptocurrency exchange marketplace backend.
//!
//! Users register, post offers, open trades against them, message each other
//! inside a trade, and keep per-currency wallets whose balances move only
//! through an append-only transaction ledger. Admins moderate users and
//! trades.
//!
//! # Modules
//!
//! - [`account`] - User accounts, roles and moderation
//! - [`auth`] - Caller resolution and access policy
//! - [`user_auth`] - Registration, login, JWT middleware
//! - [`offers`] - The offer book
//! - [`trades`] - Trade lifecycle, status state machine, messaging
//! - [`wallets`] - Wallet ledger with atomic balance updates
//! - [`gateway`] - HTTP surface
//! - [`db`] - SQLite pool and schema

pub mod account;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod offers;
pub mod trades;
pub mod user_auth;
pub mod wallets;

// Convenient re-exports at crate root
pub use account::{User, UserRepository, UserRole};
pub use auth::Caller;
pub use config::AppConfig;
pub use db::Database;
pub use error::ApiError;
pub use offers::OfferBook;
pub use trades::{TradeEngine, TradeStatus};
pub use wallets::WalletLedger;
