//! Wallet ledger: per-currency wallets and their append-only transaction log.

pub mod handlers;
pub mod ledger;
pub mod models;

pub use ledger::WalletLedger;
pub use models::{
    Transaction, TransactionCreate, TransactionData, TransactionStatus, TransactionType, Wallet,
    WalletCreate, WalletData,
};
