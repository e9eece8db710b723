// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Current price generation endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ApiError, EngineError};
use crate::models::PricePoint;
use crate::state::AppState;

/// Query parameters for the prices endpoint.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PricesQuery {
    /// Reference fiat currency for the conversion rate
    #[param(default = "NGN")]
    pub currency: Option<String>,
}

/// Current USD prices for every tracked asset plus the fiat rate.
///
/// Served from the price cache; hits an upstream provider only when the
/// cached generation has expired.
#[utoipa::path(
    get,
    path = "/v1/prices",
    tag = "Prices",
    params(PricesQuery),
    responses(
        (status = 200, description = "Current price generation", body = PricePoint),
        (status = 503, description = "Price data unavailable")
    )
)]
pub async fn get_prices(
    State(state): State<AppState>,
    Query(query): Query<PricesQuery>,
) -> Result<Json<PricePoint>, ApiError> {
    let currency = super::balance::parse_currency(query.currency.as_deref())?;
    let symbols = state.registry.supported_symbols();

    let point = state
        .prices
        .price_point(&symbols, &currency)
        .await
        .map_err(|e| ApiError::from(EngineError::from(e)))?;

    Ok(Json(point))
}
