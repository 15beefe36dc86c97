//! OpenAPI documentation, served as JSON at `/api-docs/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "NexusSwap Marketplace API",
        version = "1.0.0",
        description = "Peer-to-peer cryptocurrency exchange marketplace: offers, trades, per-trade messaging and wallet ledgers."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::health_check,
        crate::user_auth::handlers::register,
        crate::user_auth::handlers::login,
        crate::account::handlers::get_me,
        crate::account::handlers::get_user,
        crate::account::handlers::update_user,
        crate::account::handlers::admin_list_users,
        crate::account::handlers::admin_block_user,
        crate::account::handlers::admin_unblock_user,
        crate::offers::handlers::create_offer,
        crate::offers::handlers::list_offers,
        crate::offers::handlers::get_offer,
        crate::offers::handlers::update_offer,
        crate::offers::handlers::delete_offer,
        crate::trades::handlers::create_trade,
        crate::trades::handlers::list_trades,
        crate::trades::handlers::get_trade,
        crate::trades::handlers::update_trade,
        crate::trades::handlers::post_message,
        crate::trades::handlers::list_messages,
        crate::wallets::handlers::create_wallet,
        crate::wallets::handlers::list_wallets,
        crate::wallets::handlers::get_wallet,
        crate::wallets::handlers::get_balance,
        crate::wallets::handlers::record_transaction,
        crate::wallets::handlers::list_transactions,
    ),
    components(schemas(
        crate::gateway::types::HealthData,
        crate::user_auth::RegisterRequest,
        crate::user_auth::LoginRequest,
        crate::user_auth::AuthResponse,
        crate::account::UserData,
        crate::account::UserUpdate,
        crate::account::UserRole,
        crate::offers::OfferData,
        crate::offers::OfferCreate,
        crate::offers::OfferUpdate,
        crate::trades::TradeData,
        crate::trades::TradeCreate,
        crate::trades::TradeUpdate,
        crate::trades::TradeStatus,
        crate::trades::TradeMessageData,
        crate::trades::TradeMessageCreate,
        crate::wallets::WalletData,
        crate::wallets::WalletCreate,
        crate::wallets::TransactionData,
        crate::wallets::TransactionCreate,
        crate::wallets::TransactionType,
        crate::wallets::TransactionStatus,
        crate::wallets::handlers::BalanceData,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "Account management"),
        (name = "Admin", description = "Moderation endpoints"),
        (name = "Offers", description = "Standing sell offers"),
        (name = "Trades", description = "Trade lifecycle and messaging"),
        (name = "Wallets", description = "Wallets and transaction ledger"),
    )
)]
pub struct ApiDoc;
