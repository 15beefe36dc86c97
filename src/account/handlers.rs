use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;

use super::models::{UserData, UserUpdate};
use super::repository::UserRepository;
use crate::auth::{policy, Caller};
use crate::error::ApiError;
use crate::gateway::{state::AppState, types::ApiResponse};
use crate::user_auth::{hash_password, Claims};

/// The caller's own account
///
/// GET /api/v1/users/me
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Caller's account", body = ApiResponse<UserData>)
    ),
    tag = "Users"
)]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let user = UserRepository::get_by_id(state.db.pool(), caller.user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// Get a user by id
///
/// GET /api/v1/users/{id}
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserData>),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    Caller::resolve(state.db.pool(), &claims).await?;
    let user = UserRepository::get_by_id(state.db.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// Patch a user account
///
/// PUT /api/v1/users/{id}. Self or admin; the moderation flags
/// (`is_active` / `is_blocked`) are admin-only.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated user", body = ApiResponse<UserData>),
        (status = 403, description = "Not self, or moderation flags without admin"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email or username taken")
    ),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(patch): Json<UserUpdate>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    let mut user = UserRepository::get_by_id(state.db.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if !policy::can_update_user(&caller, &user, patch.touches_moderation_flags()) {
        return Err(ApiError::Forbidden("cannot modify this account"));
    }

    if let Some(email) = patch.email {
        if email.trim().is_empty() {
            return Err(ApiError::invalid_input("email must not be empty"));
        }
        user.email = email.trim().to_string();
    }
    if let Some(username) = patch.username {
        if username.trim().len() < 3 {
            return Err(ApiError::invalid_input(
                "username must be at least 3 characters",
            ));
        }
        user.username = username.trim().to_string();
    }
    if let Some(password) = patch.password {
        if password.len() < 8 {
            return Err(ApiError::invalid_input(
                "password must be at least 8 characters",
            ));
        }
        user.hashed_password = hash_password(&password)?;
    }
    if let Some(is_active) = patch.is_active {
        user.is_active = is_active;
    }
    if let Some(is_blocked) = patch.is_blocked {
        user.is_blocked = is_blocked;
    }

    UserRepository::save(state.db.pool(), &user)
        .await
        .map_err(|e| ApiError::from_unique_violation(e, "email or username already taken"))?;

    tracing::info!(user_id = user.id, by = caller.user_id, "user updated");
    Ok(Json(ApiResponse::success(user.into())))
}

/// List all users (admin)
///
/// GET /api/v1/admin/users
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    responses(
        (status = 200, description = "All users", body = ApiResponse<Vec<UserData>>),
        (status = 403, description = "Caller is not an admin")
    ),
    tag = "Admin"
)]
pub async fn admin_list_users(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<UserData>>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    policy::require_admin(&caller)?;

    let users = UserRepository::list_all(state.db.pool()).await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserData::from).collect(),
    )))
}

/// Block a user (admin)
///
/// POST /api/v1/admin/users/{id}/block
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/block",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User blocked", body = ApiResponse<UserData>),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found")
    ),
    tag = "Admin"
)]
pub async fn admin_block_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    set_blocked(state, claims, id, true).await
}

/// Unblock a user (admin)
///
/// POST /api/v1/admin/users/{id}/unblock
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/unblock",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User unblocked", body = ApiResponse<UserData>),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found")
    ),
    tag = "Admin"
)]
pub async fn admin_unblock_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    set_blocked(state, claims, id, false).await
}

async fn set_blocked(
    state: Arc<AppState>,
    claims: Claims,
    id: i64,
    blocked: bool,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let caller = Caller::resolve(state.db.pool(), &claims).await?;
    policy::require_admin(&caller)?;

    if !UserRepository::set_blocked(state.db.pool(), id, blocked).await? {
        return Err(ApiError::NotFound("user"));
    }
    let user = UserRepository::get_by_id(state.db.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    tracing::info!(user_id = id, by = caller.user_id, blocked, "moderation flag changed");
    Ok(Json(ApiResponse::success(user.into())))
}
