use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::ledger::WalletLedger;
use super::models::{TransactionCreate, TransactionData, WalletCreate, WalletData};
use crate::auth::Caller;
use crate::error::ApiError;
use crate::gateway::{state::AppState, types::ApiResponse};
use crate::user_auth::Claims;

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceData {
    pub wallet_id: i64,
    pub balance: Decimal,
}

/// Create a wallet for the caller
///
/// POST /api/v1/wallets
#[utoipa::path(
    post,
    path = "/api/v1/wallets",
    request_body = WalletCreate,
    responses(
        (status = 201, description = "Wallet created", body = ApiResponse<WalletData>),
        (status = 409, description = "Duplicate (user, currency) pair or address")
    ),
    tag = "Wallets"
)]
pub async fn create_wallet(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<WalletCreate>,
) -> Result<(StatusCode, Json<ApiResponse<WalletData>>), ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let wallet = WalletLedger::create_wallet(state.db.pool(), &caller, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(wallet.into())),
    ))
}

/// List the caller's wallets
///
/// GET /api/v1/wallets
#[utoipa::path(
    get,
    path = "/api/v1/wallets",
    responses(
        (status = 200, description = "Caller's wallets", body = ApiResponse<Vec<WalletData>>)
    ),
    tag = "Wallets"
)]
pub async fn list_wallets(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<WalletData>>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let wallets = WalletLedger::list_mine(state.db.pool(), &caller).await?;
    Ok(Json(ApiResponse::success(
        wallets.into_iter().map(WalletData::from).collect(),
    )))
}

/// Get one of the caller's wallets
///
/// GET /api/v1/wallets/{id}
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{id}",
    params(("id" = i64, Path, description = "Wallet id")),
    responses(
        (status = 200, description = "Wallet", body = ApiResponse<WalletData>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Wallet not found")
    ),
    tag = "Wallets"
)]
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<WalletData>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let wallet = WalletLedger::get(state.db.pool(), &caller, id).await?;
    Ok(Json(ApiResponse::success(wallet.into())))
}

/// Get a wallet's balance
///
/// GET /api/v1/wallets/{id}/balance
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{id}/balance",
    params(("id" = i64, Path, description = "Wallet id")),
    responses(
        (status = 200, description = "Current balance", body = ApiResponse<BalanceData>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Wallet not found")
    ),
    tag = "Wallets"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BalanceData>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let balance = WalletLedger::get_balance(state.db.pool(), &caller, id).await?;
    Ok(Json(ApiResponse::success(BalanceData {
        wallet_id: id,
        balance,
    })))
}

/// Record a deposit / withdrawal / transfer / escrow entry
///
/// POST /api/v1/wallets/{id}/transactions
#[utoipa::path(
    post,
    path = "/api/v1/wallets/{id}/transactions",
    params(("id" = i64, Path, description = "Wallet id")),
    request_body = TransactionCreate,
    responses(
        (status = 201, description = "Entry recorded", body = ApiResponse<TransactionData>),
        (status = 400, description = "Non-positive amount or insufficient funds"),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Duplicate reference_id")
    ),
    tag = "Wallets"
)]
pub async fn record_transaction(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<TransactionCreate>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionData>>), ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let entry = WalletLedger::record_transaction(state.db.pool(), &caller, id, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(entry.into()))))
}

/// List a wallet's transactions in creation order
///
/// GET /api/v1/wallets/{id}/transactions
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{id}/transactions",
    params(("id" = i64, Path, description = "Wallet id")),
    responses(
        (status = 200, description = "Append-only ledger", body = ApiResponse<Vec<TransactionData>>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Wallet not found")
    ),
    tag = "Wallets"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<TransactionData>>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let entries = WalletLedger::list_transactions(state.db.pool(), &caller, id).await?;
    Ok(Json(ApiResponse::success(
        entries.into_iter().map(TransactionData::from).collect(),
    )))
}
