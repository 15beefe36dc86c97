use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;

use super::book::{DeleteOutcome, OfferBook};
use super::models::{OfferCreate, OfferData, OfferFilter, OfferUpdate};
use crate::auth::Caller;
use crate::error::ApiError;
use crate::gateway::{state::AppState, types::ApiResponse};
use crate::user_auth::Claims;

/// Post a new offer
///
/// POST /api/v1/offers
#[utoipa::path(
    post,
    path = "/api/v1/offers",
    request_body = OfferCreate,
    responses(
        (status = 201, description = "Offer created", body = ApiResponse<OfferData>),
        (status = 400, description = "Invalid amount range or price"),
        (status = 401, description = "Unauthenticated")
    ),
    tag = "Offers"
)]
pub async fn create_offer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<OfferCreate>,
) -> Result<(StatusCode, Json<ApiResponse<OfferData>>), ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let offer = OfferBook::create(state.db.pool(), caller.user_id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(offer.into())),
    ))
}

/// List active offers, optionally filtered
///
/// GET /api/v1/offers
#[utoipa::path(
    get,
    path = "/api/v1/offers",
    params(OfferFilter),
    responses(
        (status = 200, description = "Active offers", body = ApiResponse<Vec<OfferData>>)
    ),
    tag = "Offers"
)]
pub async fn list_offers(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<OfferFilter>,
) -> Result<Json<ApiResponse<Vec<OfferData>>>, ApiError> {
    let offers = OfferBook::list(state.db.pool(), &filter).await?;
    Ok(Json(ApiResponse::success(
        offers.into_iter().map(OfferData::from).collect(),
    )))
}

/// Get a single offer
///
/// GET /api/v1/offers/{offer_id}
#[utoipa::path(
    get,
    path = "/api/v1/offers/{offer_id}",
    params(("offer_id" = i64, Path, description = "Offer id")),
    responses(
        (status = 200, description = "Offer", body = ApiResponse<OfferData>),
        (status = 404, description = "Offer not found")
    ),
    tag = "Offers"
)]
pub async fn get_offer(
    State(state): State<Arc<AppState>>,
    Path(offer_id): Path<i64>,
) -> Result<Json<ApiResponse<OfferData>>, ApiError> {
    let offer = OfferBook::get(state.db.pool(), offer_id).await?;
    Ok(Json(ApiResponse::success(offer.into())))
}

/// Patch an offer (seller or admin)
///
/// PUT /api/v1/offers/{offer_id}
#[utoipa::path(
    put,
    path = "/api/v1/offers/{offer_id}",
    params(("offer_id" = i64, Path, description = "Offer id")),
    request_body = OfferUpdate,
    responses(
        (status = 200, description = "Updated offer", body = ApiResponse<OfferData>),
        (status = 403, description = "Not the seller or an admin"),
        (status = 404, description = "Offer not found")
    ),
    tag = "Offers"
)]
pub async fn update_offer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(offer_id): Path<i64>,
    Json(patch): Json<OfferUpdate>,
) -> Result<Json<ApiResponse<OfferData>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let offer = OfferBook::update(state.db.pool(), &caller, offer_id, patch).await?;
    Ok(Json(ApiResponse::success(offer.into())))
}

/// Delete an offer (seller or admin); offers with trades are deactivated
///
/// DELETE /api/v1/offers/{offer_id}
#[utoipa::path(
    delete,
    path = "/api/v1/offers/{offer_id}",
    params(("offer_id" = i64, Path, description = "Offer id")),
    responses(
        (status = 200, description = "Offer deleted or deactivated", body = ApiResponse<String>),
        (status = 403, description = "Not the seller or an admin"),
        (status = 404, description = "Offer not found")
    ),
    tag = "Offers"
)]
pub async fn delete_offer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(offer_id): Path<i64>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let outcome = OfferBook::delete(state.db.pool(), &caller, offer_id).await?;
    let msg = match outcome {
        DeleteOutcome::Deleted => "Offer deleted successfully",
        DeleteOutcome::Deactivated => "Offer deactivated (existing trades reference it)",
    };
    Ok(Json(ApiResponse::success(msg.to_string())))
}
