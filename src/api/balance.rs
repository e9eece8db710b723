// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Balance and portfolio valuation endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, EngineError};
use crate::models::{AssetQuote, FailedBalance, Network, PortfolioSnapshot};
use crate::state::AppState;
use crate::storage::WalletRepository;

/// Query parameters for a wallet balance request.
#[derive(Debug, Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Asset symbol to query. Omit to query every supported asset.
    pub asset: Option<String>,
}

/// Balances for one wallet.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    /// Wallet ID
    pub wallet_id: String,
    /// Network the wallet lives on
    pub network: Network,
    /// Public address queried
    pub address: String,
    /// Resolved balances
    pub balances: Vec<AssetQuote>,
    /// Queries that failed, with reasons
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedBalance>,
}

/// Query live balances for one wallet.
///
/// With `?asset=`, a single balance is fetched and any failure surfaces as
/// an HTTP error. Without it, every supported asset on the wallet's network
/// is queried concurrently and partial failures are listed per asset.
#[utoipa::path(
    get,
    path = "/v1/wallets/{wallet_id}/balance",
    tag = "Balances",
    params(
        ("wallet_id" = String, Path, description = "Wallet ID"),
        BalanceQuery
    ),
    responses(
        (status = 200, description = "Balances retrieved", body = BalanceResponse),
        (status = 400, description = "Unsupported asset"),
        (status = 404, description = "Wallet not found"),
        (status = 502, description = "Upstream RPC failure"),
        (status = 503, description = "Network timeout")
    )
)]
pub async fn get_wallet_balance(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let repo = WalletRepository::new(state.store());
    let record = repo
        .get(&wallet_id)
        .map_err(|e| super::wallets::storage_error(&wallet_id, e))?;

    if let Some(asset) = query.asset.as_deref() {
        let quote = state
            .aggregator
            .fetch_one(&record, asset)
            .await
            .map_err(|e| ApiError::from(EngineError::from(e)))?;
        return Ok(Json(BalanceResponse {
            wallet_id: record.wallet_id,
            network: record.network,
            address: record.address,
            balances: vec![quote],
            failures: Vec::new(),
        }));
    }

    let batch = state.aggregator.fetch_all(std::slice::from_ref(&record)).await;
    Ok(Json(BalanceResponse {
        wallet_id: record.wallet_id,
        network: record.network,
        address: record.address,
        balances: batch.balances.into_iter().map(|b| b.quote).collect(),
        failures: batch.failures,
    }))
}

/// Query parameters for portfolio valuation.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PortfolioQuery {
    /// Reference fiat currency for the totals
    #[param(default = "NGN")]
    pub currency: Option<String>,
}

/// Value every wallet against one price generation.
///
/// All balances in the snapshot are valued from a single set of prices
/// fetched together; balance failures degrade the snapshot status rather
/// than failing the request.
#[utoipa::path(
    get,
    path = "/v1/portfolio",
    tag = "Balances",
    params(PortfolioQuery),
    responses(
        (status = 200, description = "Portfolio snapshot", body = PortfolioSnapshot),
        (status = 503, description = "Price data unavailable")
    )
)]
pub async fn get_portfolio(
    State(state): State<AppState>,
    Query(query): Query<PortfolioQuery>,
) -> Result<Json<PortfolioSnapshot>, ApiError> {
    let currency = parse_currency(query.currency.as_deref())?;

    let repo = WalletRepository::new(state.store());
    let wallets = repo
        .list_all()
        .map_err(|e| ApiError::from(EngineError::Storage(e)))?;

    let snapshot = state
        .valuator
        .value_portfolio(&wallets, &currency)
        .await
        .map_err(|e| ApiError::from(EngineError::from(e)))?;

    Ok(Json(snapshot))
}

/// Validate the reference currency parameter before it reaches the price
/// cache, where it becomes part of a cache key.
pub(super) fn parse_currency(raw: Option<&str>) -> Result<String, ApiError> {
    let currency = raw.unwrap_or("NGN").trim();
    if (3..=5).contains(&currency.len()) && currency.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(currency.to_ascii_uppercase())
    } else {
        Err(EngineError::InvalidInput(format!("invalid currency code: {currency}")).into())
    }
}
