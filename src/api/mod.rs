// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        AssetQuote, FailedBalance, Network, PortfolioEntry, PortfolioSnapshot, PortfolioStatus,
        PricePoint,
    },
    state::AppState,
    storage::WalletResponse,
};

pub mod balance;
pub mod health;
pub mod prices;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/wallets/generate", post(wallets::generate_wallet))
        .route("/wallets", get(wallets::list_wallets))
        .route(
            "/wallets/{wallet_id}",
            get(wallets::get_wallet).delete(wallets::delete_wallet),
        )
        .route("/wallets/{wallet_id}/balance", get(balance::get_wallet_balance))
        .route("/portfolio", get(balance::get_portfolio))
        .route("/prices", get(prices::get_prices));

    Router::new()
        .nest("/v1", v1_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        wallets::generate_wallet,
        wallets::list_wallets,
        wallets::get_wallet,
        wallets::delete_wallet,
        balance::get_wallet_balance,
        balance::get_portfolio,
        prices::get_prices,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Network,
            WalletResponse,
            wallets::GenerateWalletRequest,
            AssetQuote,
            FailedBalance,
            balance::BalanceResponse,
            PortfolioEntry,
            PortfolioSnapshot,
            PortfolioStatus,
            PricePoint,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Wallets", description = "Wallet generation and lifecycle"),
        (name = "Balances", description = "Balance queries and portfolio valuation"),
        (name = "Prices", description = "Cached market prices"),
        (name = "Health", description = "Service health probes")
    )
)]
struct ApiDoc;
