use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;

use super::engine::TradeEngine;
use super::messages::Messaging;
use super::models::{TradeCreate, TradeData, TradeMessageCreate, TradeMessageData, TradeUpdate};
use crate::auth::Caller;
use crate::error::ApiError;
use crate::gateway::{state::AppState, types::ApiResponse};
use crate::user_auth::Claims;

/// Open a trade against an offer
///
/// POST /api/v1/trades
#[utoipa::path(
    post,
    path = "/api/v1/trades",
    request_body = TradeCreate,
    responses(
        (status = 201, description = "Trade opened", body = ApiResponse<TradeData>),
        (status = 400, description = "Offer inactive or amount out of range"),
        (status = 404, description = "Offer not found")
    ),
    tag = "Trades"
)]
pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<TradeCreate>,
) -> Result<(StatusCode, Json<ApiResponse<TradeData>>), ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let trade = TradeEngine::open(state.db.pool(), &caller, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(trade.into())),
    ))
}

/// List the caller's trades (as buyer or seller)
///
/// GET /api/v1/trades
#[utoipa::path(
    get,
    path = "/api/v1/trades",
    responses(
        (status = 200, description = "Caller's trades", body = ApiResponse<Vec<TradeData>>)
    ),
    tag = "Trades"
)]
pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<TradeData>>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let trades = TradeEngine::list_mine(state.db.pool(), &caller).await?;
    Ok(Json(ApiResponse::success(
        trades.into_iter().map(TradeData::from).collect(),
    )))
}

/// Get a trade by its public id
///
/// GET /api/v1/trades/{trade_id}
#[utoipa::path(
    get,
    path = "/api/v1/trades/{trade_id}",
    params(("trade_id" = String, Path, description = "Public trade id")),
    responses(
        (status = 200, description = "Trade", body = ApiResponse<TradeData>),
        (status = 403, description = "Not a party to this trade"),
        (status = 404, description = "Trade not found")
    ),
    tag = "Trades"
)]
pub async fn get_trade(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(trade_id): Path<String>,
) -> Result<Json<ApiResponse<TradeData>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let trade = TradeEngine::get(state.db.pool(), &caller, &trade_id).await?;
    Ok(Json(ApiResponse::success(trade.into())))
}

/// Update trade status / moderator assignment
///
/// PUT /api/v1/trades/{trade_id}
#[utoipa::path(
    put,
    path = "/api/v1/trades/{trade_id}",
    params(("trade_id" = String, Path, description = "Public trade id")),
    request_body = TradeUpdate,
    responses(
        (status = 200, description = "Updated trade", body = ApiResponse<TradeData>),
        (status = 400, description = "Illegal status transition"),
        (status = 403, description = "Not a party to this trade"),
        (status = 404, description = "Trade not found")
    ),
    tag = "Trades"
)]
pub async fn update_trade(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(trade_id): Path<String>,
    Json(patch): Json<TradeUpdate>,
) -> Result<Json<ApiResponse<TradeData>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let trade = TradeEngine::update(state.db.pool(), &caller, &trade_id, patch).await?;
    Ok(Json(ApiResponse::success(trade.into())))
}

/// Post a message in a trade's thread
///
/// POST /api/v1/trades/{trade_id}/messages
#[utoipa::path(
    post,
    path = "/api/v1/trades/{trade_id}/messages",
    params(("trade_id" = String, Path, description = "Public trade id")),
    request_body = TradeMessageCreate,
    responses(
        (status = 201, description = "Message posted", body = ApiResponse<TradeMessageData>),
        (status = 403, description = "Not a party to this trade"),
        (status = 404, description = "Trade not found")
    ),
    tag = "Trades"
)]
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(trade_id): Path<String>,
    Json(req): Json<TradeMessageCreate>,
) -> Result<(StatusCode, Json<ApiResponse<TradeMessageData>>), ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let message = Messaging::post(state.db.pool(), &caller, &trade_id, req.content).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(message.into())),
    ))
}

/// List a trade's messages in creation order
///
/// GET /api/v1/trades/{trade_id}/messages
#[utoipa::path(
    get,
    path = "/api/v1/trades/{trade_id}/messages",
    params(("trade_id" = String, Path, description = "Public trade id")),
    responses(
        (status = 200, description = "Message thread", body = ApiResponse<Vec<TradeMessageData>>),
        (status = 403, description = "Not a party to this trade"),
        (status = 404, description = "Trade not found")
    ),
    tag = "Trades"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(trade_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<TradeMessageData>>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let messages = Messaging::list(state.db.pool(), &caller, &trade_id).await?;
    Ok(Json(ApiResponse::success(
        messages.into_iter().map(TradeMessageData::from).collect(),
    )))
}
