//! Authorization policy.
//!
//! Every role/ownership rule lives here, as predicate functions over a
//! resolved [`Caller`]. Handlers never compare roles directly, which keeps
//! the rule set auditable in one place.

use crate::account::{User, UserRepository, UserRole};
use crate::error::ApiError;
use crate::offers::Offer;
use crate::trades::Trade;
use crate::user_auth::Claims;
use crate::wallets::Wallet;
use sqlx::SqlitePool;

/// An authenticated, operational caller.
///
/// Resolved from verified JWT claims plus the live user row, so a user who
/// was blocked after the token was issued is rejected on the next request.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: i64,
    pub role: UserRole,
}

impl Caller {
    pub async fn resolve(pool: &SqlitePool, claims: &Claims) -> Result<Self, ApiError> {
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthenticated("malformed token subject"))?;

        let user = UserRepository::get_by_id(pool, user_id)
            .await?
            .ok_or(ApiError::Unauthenticated("unknown user"))?;

        if !user.is_operational() {
            return Err(ApiError::Forbidden("account is blocked or inactive"));
        }

        Ok(Self {
            user_id: user.id,
            role: user.role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Admin-only operations (moderation endpoints).
pub fn require_admin(caller: &Caller) -> Result<(), ApiError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("admin role required"))
    }
}

/// A user record may be patched by its owner or an admin; the moderation
/// flags themselves are admin-only.
pub fn can_update_user(caller: &Caller, target: &User, touches_moderation: bool) -> bool {
    if caller.is_admin() {
        return true;
    }
    caller.user_id == target.id && !touches_moderation
}

/// Offers are mutated by their seller or an admin.
pub fn can_manage_offer(caller: &Caller, offer: &Offer) -> bool {
    caller.is_admin() || caller.user_id == offer.seller_id
}

/// Buyer or seller of the trade, role ignored.
pub fn is_trade_party(caller: &Caller, trade: &Trade) -> bool {
    caller.user_id == trade.buyer_id || caller.user_id == trade.seller_id
}

/// Trades are visible to and updatable by their parties or an admin.
pub fn can_access_trade(caller: &Caller, trade: &Trade) -> bool {
    caller.is_admin() || is_trade_party(caller, trade)
}

/// Trade messages are strictly party-to-party.
pub fn can_message_trade(caller: &Caller, trade: &Trade) -> bool {
    is_trade_party(caller, trade)
}

/// Wallets (balance, transactions) are owner-only.
pub fn owns_wallet(caller: &Caller, wallet: &Wallet) -> bool {
    caller.user_id == wallet.user_id
}
