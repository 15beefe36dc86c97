//! Relational schema, created at startup.
//!
//! Monetary columns (`balance`, amounts, prices) are stored as TEXT holding
//! exact decimal strings; all arithmetic and comparisons happen in Rust on
//! `rust_decimal::Decimal`, so values round-trip without loss. `wallets`
//! carries a `version` counter guarding compare-and-swap balance updates.

use sqlx::SqlitePool;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    email           TEXT NOT NULL UNIQUE,
    username        TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    role            TEXT NOT NULL DEFAULT 'user',
    is_active       INTEGER NOT NULL DEFAULT 1,
    is_blocked      INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
)
"#;

const CREATE_OFFERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS offers (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    seller_id      INTEGER NOT NULL REFERENCES users(id),
    currency       TEXT NOT NULL,
    min_amount     TEXT NOT NULL,
    max_amount     TEXT NOT NULL,
    price_per_unit TEXT NOT NULL,
    is_active      INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL
)
"#;

const CREATE_WALLETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wallets (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id        INTEGER NOT NULL REFERENCES users(id),
    currency       TEXT NOT NULL,
    balance        TEXT NOT NULL DEFAULT '0',
    wallet_address TEXT NOT NULL UNIQUE,
    is_escrow      INTEGER NOT NULL DEFAULT 0,
    version        INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,
    UNIQUE (user_id, currency)
)
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    wallet_id        INTEGER NOT NULL REFERENCES wallets(id),
    amount           TEXT NOT NULL,
    transaction_type TEXT NOT NULL,
    status           TEXT NOT NULL,
    reference_id     TEXT NOT NULL UNIQUE,
    created_at       TEXT NOT NULL
)
"#;

const CREATE_TRADES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS trades (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    trade_id       TEXT NOT NULL UNIQUE,
    offer_id       INTEGER NOT NULL REFERENCES offers(id),
    buyer_id       INTEGER NOT NULL REFERENCES users(id),
    seller_id      INTEGER NOT NULL REFERENCES users(id),
    amount         TEXT NOT NULL,
    price_per_unit TEXT NOT NULL,
    total_price    TEXT NOT NULL,
    status         TEXT NOT NULL DEFAULT 'pending',
    moderator_id   INTEGER REFERENCES users(id),
    created_at     TEXT NOT NULL
)
"#;

const CREATE_TRADE_MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS trade_messages (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    trade_id   INTEGER NOT NULL REFERENCES trades(id),
    sender_id  INTEGER NOT NULL REFERENCES users(id),
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_offers_currency ON offers(currency)",
    "CREATE INDEX IF NOT EXISTS idx_trades_buyer ON trades(buyer_id)",
    "CREATE INDEX IF NOT EXISTS idx_trades_seller ON trades(seller_id)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_wallet ON transactions(wallet_id)",
    "CREATE INDEX IF NOT EXISTS idx_trade_messages_trade ON trade_messages(trade_id)",
];

/// Create all tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for ddl in [
        CREATE_USERS_TABLE,
        CREATE_OFFERS_TABLE,
        CREATE_WALLETS_TABLE,
        CREATE_TRANSACTIONS_TABLE,
        CREATE_TRADES_TABLE,
        CREATE_TRADE_MESSAGES_TABLE,
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }

    for ddl in CREATE_INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    tracing::info!("database schema initialized");
    Ok(())
}
