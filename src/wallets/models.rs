//! Wallet and transaction data models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Ledger entry kind.
///
/// `deposit` and `withdrawal` move the wallet balance synchronously.
/// `transfer` and `escrow` are recorded `pending` with no single-wallet
/// balance effect; their settlement leg runs outside this API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    Escrow,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
            TransactionType::Escrow => "escrow",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(TransactionType::Deposit),
            "withdrawal" => Some(TransactionType::Withdrawal),
            "transfer" => Some(TransactionType::Transfer),
            "escrow" => Some(TransactionType::Escrow),
            _ => None,
        }
    }

    /// Whether this kind changes the balance at creation time.
    pub fn applies_to_balance(self) -> bool {
        matches!(self, TransactionType::Deposit | TransactionType::Withdrawal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

/// Wallet row.
///
/// One per (user, currency) pair. `balance` is only ever changed through
/// `WalletLedger::record_transaction`; `version` guards concurrent balance
/// writes with compare-and-swap.
#[derive(Debug, Clone)]
pub struct Wallet {
    pub id: i64,
    pub user_id: i64,
    pub currency: String,
    pub balance: Decimal,
    pub wallet_address: String,
    pub is_escrow: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// Public view of a wallet
#[derive(Debug, Serialize, ToSchema)]
pub struct WalletData {
    pub id: i64,
    pub user_id: i64,
    pub currency: String,
    pub balance: Decimal,
    pub wallet_address: String,
    pub is_escrow: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Wallet> for WalletData {
    fn from(w: Wallet) -> Self {
        WalletData {
            id: w.id,
            user_id: w.user_id,
            currency: w.currency,
            balance: w.balance,
            wallet_address: w.wallet_address,
            is_escrow: w.is_escrow,
            created_at: w.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WalletCreate {
    pub currency: String,
    pub wallet_address: String,
}

/// Ledger entry. Append-only; rows are never updated or deleted.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i64,
    pub wallet_id: i64,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub reference_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionData {
    pub id: i64,
    pub wallet_id: i64,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub reference_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionData {
    fn from(t: Transaction) -> Self {
        TransactionData {
            id: t.id,
            wallet_id: t.wallet_id,
            amount: t.amount,
            transaction_type: t.transaction_type,
            status: t.status,
            reference_id: t.reference_id,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransactionCreate {
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    /// External dedup key; a fresh one is generated when omitted.
    pub reference_id: Option<String>,
}
