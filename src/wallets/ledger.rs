//! Wallet ledger operations.
//!
//! The balance is never written directly: every change goes through
//! [`WalletLedger::record_transaction`], which pairs the balance write with
//! the ledger insert in one storage transaction. The write is guarded by the
//! wallet row's `version` column; on a compare-and-swap miss the whole
//! attempt is retried against a fresh read, so a concurrent loser observes
//! the post-winner balance and fails funds checks honestly.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::models::{
    Transaction, TransactionCreate, TransactionStatus, TransactionType, Wallet, WalletCreate,
};
use crate::auth::policy::{self, Caller};
use crate::db::decimal_column;
use crate::error::ApiError;

const WALLET_COLUMNS: &str =
    "id, user_id, currency, balance, wallet_address, is_escrow, version, created_at";
const TX_COLUMNS: &str =
    "id, wallet_id, amount, transaction_type, status, reference_id, created_at";

/// CAS misses beyond this count abort the request.
const MAX_CAS_RETRIES: u32 = 8;

fn map_wallet(r: &SqliteRow) -> Result<Wallet, ApiError> {
    Ok(Wallet {
        id: r.get("id"),
        user_id: r.get("user_id"),
        currency: r.get("currency"),
        balance: decimal_column(r, "balance")?,
        wallet_address: r.get("wallet_address"),
        is_escrow: r.get("is_escrow"),
        version: r.get("version"),
        created_at: r.get("created_at"),
    })
}

fn map_transaction(r: &SqliteRow) -> Result<Transaction, ApiError> {
    let type_raw: String = r.get("transaction_type");
    let status_raw: String = r.get("status");
    Ok(Transaction {
        id: r.get("id"),
        wallet_id: r.get("wallet_id"),
        amount: decimal_column(r, "amount")?,
        transaction_type: TransactionType::parse(&type_raw)
            .ok_or_else(|| ApiError::internal(format!("corrupt transaction type: {type_raw}")))?,
        status: TransactionStatus::parse(&status_raw)
            .ok_or_else(|| ApiError::internal(format!("corrupt transaction status: {status_raw}")))?,
        reference_id: r.get("reference_id"),
        created_at: r.get("created_at"),
    })
}

pub struct WalletLedger;

impl WalletLedger {
    /// Create a wallet for the caller with a zero balance.
    ///
    /// One wallet per (user, currency); both that pair and the address are
    /// unique, a duplicate of either is a `Conflict`.
    pub async fn create_wallet(
        pool: &SqlitePool,
        caller: &Caller,
        spec: WalletCreate,
    ) -> Result<Wallet, ApiError> {
        let currency = spec.currency.trim();
        let address = spec.wallet_address.trim();
        if currency.is_empty() || address.is_empty() {
            return Err(ApiError::invalid_input(
                "currency and wallet_address must not be empty",
            ));
        }

        let row = sqlx::query(&format!(
            r#"INSERT INTO wallets (user_id, currency, balance, wallet_address, is_escrow, version, created_at)
               VALUES (?, ?, '0', ?, 0, 0, ?)
               RETURNING {WALLET_COLUMNS}"#
        ))
        .bind(caller.user_id)
        .bind(currency)
        .bind(address)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|e| {
            ApiError::from_unique_violation(e, "wallet for this currency or address already exists")
        })?;

        let wallet = map_wallet(&row)?;
        tracing::info!(wallet_id = wallet.id, user_id = caller.user_id, currency, "wallet created");
        Ok(wallet)
    }

    /// Get a wallet; owner only.
    pub async fn get(pool: &SqlitePool, caller: &Caller, wallet_id: i64) -> Result<Wallet, ApiError> {
        let wallet = Self::fetch(pool, wallet_id).await?;
        if !policy::owns_wallet(caller, &wallet) {
            return Err(ApiError::Forbidden("not the owner of this wallet"));
        }
        Ok(wallet)
    }

    pub async fn list_mine(pool: &SqlitePool, caller: &Caller) -> Result<Vec<Wallet>, ApiError> {
        let rows = sqlx::query(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE user_id = ? ORDER BY id"
        ))
        .bind(caller.user_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(map_wallet).collect()
    }

    pub async fn get_balance(
        pool: &SqlitePool,
        caller: &Caller,
        wallet_id: i64,
    ) -> Result<Decimal, ApiError> {
        Ok(Self::get(pool, caller, wallet_id).await?.balance)
    }

    /// Record a ledger entry; owner only, amounts strictly positive.
    ///
    /// `deposit` adds and `withdrawal` subtracts (after a funds check),
    /// recorded `completed`; the balance write and the insert commit as one
    /// unit. `transfer` / `escrow` entries are recorded `pending` and leave
    /// the balance untouched.
    pub async fn record_transaction(
        pool: &SqlitePool,
        caller: &Caller,
        wallet_id: i64,
        spec: TransactionCreate,
    ) -> Result<Transaction, ApiError> {
        if spec.amount <= Decimal::ZERO {
            return Err(ApiError::invalid_input("amount must be positive"));
        }
        let reference_id = spec
            .reference_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        // ownership gate once, before the retry loop
        let mut wallet = Self::get(pool, caller, wallet_id).await?;

        if !spec.transaction_type.applies_to_balance() {
            return Self::insert_entry(
                pool,
                wallet_id,
                spec.amount,
                spec.transaction_type,
                TransactionStatus::Pending,
                &reference_id,
            )
            .await;
        }

        for attempt in 0..MAX_CAS_RETRIES {
            let new_balance = match spec.transaction_type {
                TransactionType::Deposit => wallet
                    .balance
                    .checked_add(spec.amount)
                    .ok_or_else(|| {
                        ApiError::invalid_input("deposit would overflow the balance range")
                    })?,
                TransactionType::Withdrawal => {
                    if wallet.balance < spec.amount {
                        return Err(ApiError::InsufficientFunds);
                    }
                    wallet.balance - spec.amount
                }
                TransactionType::Transfer | TransactionType::Escrow => unreachable!(),
            };

            let mut tx = pool.begin().await?;
            let updated = sqlx::query(
                "UPDATE wallets SET balance = ?, version = version + 1 WHERE id = ? AND version = ?",
            )
            .bind(new_balance.to_string())
            .bind(wallet.id)
            .bind(wallet.version)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                // lost the race; re-read and try again
                tx.rollback().await?;
                tracing::debug!(wallet_id, attempt, "balance CAS miss, retrying");
                wallet = Self::fetch(pool, wallet_id).await?;
                continue;
            }

            let row = sqlx::query(&format!(
                r#"INSERT INTO transactions (wallet_id, amount, transaction_type, status, reference_id, created_at)
                   VALUES (?, ?, ?, ?, ?, ?)
                   RETURNING {TX_COLUMNS}"#
            ))
            .bind(wallet_id)
            .bind(spec.amount.to_string())
            .bind(spec.transaction_type.as_str())
            .bind(TransactionStatus::Completed.as_str())
            .bind(&reference_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| ApiError::from_unique_violation(e, "reference_id already used"))?;

            tx.commit().await?;

            let entry = map_transaction(&row)?;
            tracing::info!(
                wallet_id,
                transaction_type = spec.transaction_type.as_str(),
                amount = %spec.amount,
                balance = %new_balance,
                "transaction recorded"
            );
            return Ok(entry);
        }

        Err(ApiError::internal("wallet busy, balance update kept losing races"))
    }

    /// The append-only log in creation order; owner only.
    pub async fn list_transactions(
        pool: &SqlitePool,
        caller: &Caller,
        wallet_id: i64,
    ) -> Result<Vec<Transaction>, ApiError> {
        // ownership gate
        Self::get(pool, caller, wallet_id).await?;

        let rows = sqlx::query(&format!(
            "SELECT {TX_COLUMNS} FROM transactions WHERE wallet_id = ? ORDER BY id"
        ))
        .bind(wallet_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(map_transaction).collect()
    }

    async fn fetch(pool: &SqlitePool, wallet_id: i64) -> Result<Wallet, ApiError> {
        let row = sqlx::query(&format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE id = ?"))
            .bind(wallet_id)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::NotFound("wallet"))?;
        map_wallet(&row)
    }

    async fn insert_entry(
        pool: &SqlitePool,
        wallet_id: i64,
        amount: Decimal,
        transaction_type: TransactionType,
        status: TransactionStatus,
        reference_id: &str,
    ) -> Result<Transaction, ApiError> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO transactions (wallet_id, amount, transaction_type, status, reference_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?)
               RETURNING {TX_COLUMNS}"#
        ))
        .bind(wallet_id)
        .bind(amount.to_string())
        .bind(transaction_type.as_str())
        .bind(status.as_str())
        .bind(reference_id)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|e| ApiError::from_unique_violation(e, "reference_id already used"))?;

        map_transaction(&row)
    }
}
