//! HTTP gateway: router assembly and server startup.

pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::AppConfig;
use crate::db::Database;
use crate::user_auth::middleware::jwt_auth_middleware;
use state::AppState;
use types::{ApiResponse, HealthData};

/// Service and storage health
///
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service health", body = ApiResponse<HealthData>)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let database = state.db.health_check().await.is_ok();
    Json(ApiResponse::success(HealthData {
        status: if database { "ok" } else { "degraded" },
        database,
    }))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(crate::user_auth::handlers::register))
        .route("/login", post(crate::user_auth::handlers::login));

    // browsing offers needs no token; mutating them does
    let public_offer_routes = Router::new()
        .route("/offers", get(crate::offers::handlers::list_offers))
        .route("/offers/{id}", get(crate::offers::handlers::get_offer));

    let protected_offer_routes = Router::new()
        .route("/offers", post(crate::offers::handlers::create_offer))
        .route(
            "/offers/{id}",
            put(crate::offers::handlers::update_offer)
                .delete(crate::offers::handlers::delete_offer),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let trade_routes = Router::new()
        .route(
            "/trades",
            post(crate::trades::handlers::create_trade).get(crate::trades::handlers::list_trades),
        )
        .route(
            "/trades/{trade_id}",
            get(crate::trades::handlers::get_trade).put(crate::trades::handlers::update_trade),
        )
        .route(
            "/trades/{trade_id}/messages",
            post(crate::trades::handlers::post_message)
                .get(crate::trades::handlers::list_messages),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let wallet_routes = Router::new()
        .route(
            "/wallets",
            post(crate::wallets::handlers::create_wallet)
                .get(crate::wallets::handlers::list_wallets),
        )
        .route("/wallets/{id}", get(crate::wallets::handlers::get_wallet))
        .route(
            "/wallets/{id}/balance",
            get(crate::wallets::handlers::get_balance),
        )
        .route(
            "/wallets/{id}/transactions",
            post(crate::wallets::handlers::record_transaction)
                .get(crate::wallets::handlers::list_transactions),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let user_routes = Router::new()
        .route("/users/me", get(crate::account::handlers::get_me))
        .route(
            "/users/{id}",
            get(crate::account::handlers::get_user).put(crate::account::handlers::update_user),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let admin_routes = Router::new()
        .route("/users", get(crate::account::handlers::admin_list_users))
        .route(
            "/users/{id}/block",
            post(crate::account::handlers::admin_block_user),
        )
        .route(
            "/users/{id}/unblock",
            post(crate::account::handlers::admin_unblock_user),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .route("/api/v1/health", get(health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1/auth", auth_routes)
        .nest(
            "/api/v1",
            public_offer_routes
                .merge(protected_offer_routes)
                .merge(trade_routes)
                .merge(wallet_routes)
                .merge(user_routes),
        )
        .nest("/api/v1/admin", admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn run_server(config: &AppConfig, db: Arc<Database>) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(db, config.jwt_secret.clone()));
    let app = build_router(state);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "gateway listening");

    axum::serve(listener, app).await?;
    Ok(())
}
