//! End-to-end marketplace scenarios against an in-memory database, driving
//! the same services the HTTP handlers call.

use rust_decimal::Decimal;

use nexus_swap::auth::Caller;
use nexus_swap::db::Database;
use nexus_swap::error::ApiError;
use nexus_swap::offers::{OfferBook, OfferCreate, OfferUpdate};
use nexus_swap::trades::{Messaging, TradeCreate, TradeEngine, TradeStatus, TradeUpdate};
use nexus_swap::user_auth::{LoginRequest, RegisterRequest, UserAuthService};
use nexus_swap::wallets::{
    TransactionCreate, TransactionStatus, TransactionType, WalletCreate, WalletLedger,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

/// Register + login through the auth service, then resolve a caller from the
/// verified token, the same path a request takes through the JWT middleware.
async fn signup(db: &Database, auth: &UserAuthService, email: &str, username: &str) -> Caller {
    auth.register(RegisterRequest {
        email: email.to_string(),
        username: username.to_string(),
        password: "correct horse".to_string(),
    })
    .await
    .unwrap();

    let session = auth
        .login(LoginRequest {
            email: email.to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap();

    let claims = auth.verify_token(&session.token).unwrap();
    Caller::resolve(db.pool(), &claims).await.unwrap()
}

async fn setup() -> (Database, UserAuthService) {
    let db = Database::connect_in_memory().await.unwrap();
    let auth = UserAuthService::new(db.pool().clone(), "integration-secret".to_string());
    (db, auth)
}

#[tokio::test]
async fn test_offer_to_completed_trade() {
    let (db, auth) = setup().await;
    let seller = signup(&db, &auth, "seller@example.com", "seller").await;
    let buyer = signup(&db, &auth, "buyer@example.com", "buyer").await;

    let offer = OfferBook::create(
        db.pool(),
        seller.user_id,
        OfferCreate {
            currency: "BTC".to_string(),
            min_amount: dec("1"),
            max_amount: dec("10"),
            price_per_unit: dec("100"),
        },
    )
    .await
    .unwrap();

    // amount above the range is rejected before anything is written
    let err = TradeEngine::open(
        db.pool(),
        &buyer,
        TradeCreate {
            offer_id: offer.id,
            amount: dec("15"),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::AmountOutOfRange { .. }));

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
    assert_eq!(trade.buyer_id, buyer.user_id);
    assert_eq!(trade.seller_id, seller.user_id);

    // both parties talk inside the trade
    Messaging::post(db.pool(), &buyer, &trade.trade_id, "payment sent".to_string())
        .await
        .unwrap();
    Messaging::post(db.pool(), &seller, &trade.trade_id, "confirmed".to_string())
        .await
        .unwrap();
    let thread = Messaging::list(db.pool(), &seller, &trade.trade_id)
        .await
        .unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].sender_id, buyer.user_id);

    // walk the forward chain to completion
    for status in [
        TradeStatus::InProgress,
        TradeStatus::Paid,
        TradeStatus::Completed,
    ] {
        TradeEngine::update(
            db.pool(),
            &seller,
            &trade.trade_id,
            TradeUpdate {
                status: Some(status),
                moderator_id: None,
            },
        )
        .await
        .unwrap();
    }

    let done = TradeEngine::get(db.pool(), &buyer, &trade.trade_id)
        .await
        .unwrap();
    assert_eq!(done.status, TradeStatus::Completed);

    // completed is terminal
    let err = TradeEngine::update(
        db.pool(),
        &seller,
        &trade.trade_id,
        TradeUpdate {
            status: Some(TradeStatus::Cancelled),
            moderator_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_trade_terms_survive_offer_repricing() {
    let (db, auth) = setup().await;
    let seller = signup(&db, &auth, "seller@example.com", "seller").await;
    let buyer = signup(&db, &auth, "buyer@example.com", "buyer").await;

    let offer = OfferBook::create(
        db.pool(),
        seller.user_id,
        OfferCreate {
            currency: "ETH".to_string(),
            min_amount: dec("1"),
            max_amount: dec("10"),
            price_per_unit: dec("100"),
        },
    )
    .await
    .unwrap();

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

    OfferBook::update(
        db.pool(),
        &seller,
        offer.id,
        OfferUpdate {
            price_per_unit: Some(dec("250")),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let reloaded = TradeEngine::get(db.pool(), &buyer, &trade.trade_id)
        .await
        .unwrap();
    assert_eq!(reloaded.price_per_unit, dec("100"));
    assert_eq!(reloaded.total_price, dec("200"));
}

#[tokio::test]
async fn test_deactivated_offer_rejects_new_trades() {
    let (db, auth) = setup().await;
    let seller = signup(&db, &auth, "seller@example.com", "seller").await;
    let buyer = signup(&db, &auth, "buyer@example.com", "buyer").await;

    let offer = OfferBook::create(
        db.pool(),
        seller.user_id,
        OfferCreate {
            currency: "BTC".to_string(),
            min_amount: dec("1"),
            max_amount: dec("10"),
            price_per_unit: dec("100"),
        },
    )
    .await
    .unwrap();

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
async fn test_wallet_deposit_withdraw_cycle() {
    let (db, auth) = setup().await;
    let user = signup(&db, &auth, "u@example.com", "user1").await;

    let wallet = WalletLedger::create_wallet(
        db.pool(),
        &user,
        WalletCreate {
            currency: "BTC".to_string(),
            wallet_address: "bc1-flow".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(wallet.balance, Decimal::ZERO);

    WalletLedger::record_transaction(
        db.pool(),
        &user,
        wallet.id,
        TransactionCreate {
            amount: dec("50"),
            transaction_type: TransactionType::Deposit,
            reference_id: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(
        WalletLedger::get_balance(db.pool(), &user, wallet.id)
            .await
            .unwrap(),
        dec("50")
    );

    let err = WalletLedger::record_transaction(
        db.pool(),
        &user,
        wallet.id,
        TransactionCreate {
            amount: dec("70"),
            transaction_type: TransactionType::Withdrawal,
            reference_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::InsufficientFunds));
    assert_eq!(
        WalletLedger::get_balance(db.pool(), &user, wallet.id)
            .await
            .unwrap(),
        dec("50")
    );

    WalletLedger::record_transaction(
        db.pool(),
        &user,
        wallet.id,
        TransactionCreate {
            amount: dec("50"),
            transaction_type: TransactionType::Withdrawal,
            reference_id: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(
        WalletLedger::get_balance(db.pool(), &user, wallet.id)
            .await
            .unwrap(),
        Decimal::ZERO
    );
}

#[tokio::test]
async fn test_concurrent_withdrawals_one_winner() {
    let (db, auth) = setup().await;
    let user = signup(&db, &auth, "u@example.com", "user1").await;

    let wallet = WalletLedger::create_wallet(
        db.pool(),
        &user,
        WalletCreate {
            currency: "BTC".to_string(),
            wallet_address: "bc1-race".to_string(),
        },
    )
    .await
    .unwrap();
    WalletLedger::record_transaction(
        db.pool(),
        &user,
        wallet.id,
        TransactionCreate {
            amount: dec("100"),
            transaction_type: TransactionType::Deposit,
            reference_id: None,
        },
    )
    .await
    .unwrap();

    let withdraw = |reference: &str| TransactionCreate {
        amount: dec("60"),
        transaction_type: TransactionType::Withdrawal,
        reference_id: Some(reference.to_string()),
    };

    let (a, b) = tokio::join!(
        WalletLedger::record_transaction(db.pool(), &user, wallet.id, withdraw("w-a")),
        WalletLedger::record_transaction(db.pool(), &user, wallet.id, withdraw("w-b")),
    );

    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
    let loser = if a.is_err() {
        a.unwrap_err()
    } else {
        b.unwrap_err()
    };
    assert!(matches!(loser, ApiError::InsufficientFunds));

    assert_eq!(
        WalletLedger::get_balance(db.pool(), &user, wallet.id)
            .await
            .unwrap(),
        dec("40")
    );

    // only the winner left a ledger row
    let completed = WalletLedger::list_transactions(db.pool(), &user, wallet.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| {
            t.transaction_type == TransactionType::Withdrawal
                && t.status == TransactionStatus::Completed
        })
        .count();
    assert_eq!(completed, 1);
}

#[tokio::test]
async fn test_second_wallet_same_currency_conflicts() {
    let (db, auth) = setup().await;
    let user = signup(&db, &auth, "u@example.com", "user1").await;

    WalletLedger::create_wallet(
        db.pool(),
        &user,
        WalletCreate {
            currency: "BTC".to_string(),
            wallet_address: "bc1-first".to_string(),
        },
    )
    .await
    .unwrap();

    let err = WalletLedger::create_wallet(
        db.pool(),
        &user,
        WalletCreate {
            currency: "BTC".to_string(),
            wallet_address: "bc1-second".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (db, auth) = setup().await;
    signup(&db, &auth, "u@example.com", "user1").await;

    let err = auth
        .register(RegisterRequest {
            email: "u@example.com".to_string(),
            username: "someone_else".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}
