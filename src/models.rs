// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Core domain types shared across the engine.
//!
//! - [`Network`] - supported blockchains and their unit conventions
//! - [`AssetQuote`] - a balance in native smallest units plus display form
//! - [`PricePoint`] - one generation of provider prices + fiat rate
//! - [`PortfolioSnapshot`] - the valuation result assembled per request

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Supported blockchain networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Bsc,
    Polygon,
    Bitcoin,
}

impl Network {
    /// All supported networks, in display order.
    pub const ALL: [Network; 4] = [
        Network::Ethereum,
        Network::Bsc,
        Network::Polygon,
        Network::Bitcoin,
    ];

    /// Lowercase identifier used in storage and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Bsc => "bsc",
            Network::Polygon => "polygon",
            Network::Bitcoin => "bitcoin",
        }
    }

    /// Symbol of the chain's base currency.
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Network::Ethereum => "ETH",
            Network::Bsc => "BNB",
            Network::Polygon => "MATIC",
            Network::Bitcoin => "BTC",
        }
    }

    /// Decimal count of the chain's smallest native unit (wei, satoshi).
    pub fn native_decimals(&self) -> u8 {
        match self {
            Network::Ethereum | Network::Bsc | Network::Polygon => 18,
            Network::Bitcoin => 8,
        }
    }

    /// Whether the network speaks Ethereum-style JSON-RPC.
    pub fn is_evm(&self) -> bool {
        !matches!(self, Network::Bitcoin)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" => Ok(Network::Ethereum),
            "bsc" => Ok(Network::Bsc),
            "polygon" => Ok(Network::Polygon),
            "bitcoin" => Ok(Network::Bitcoin),
            other => Err(format!(
                "Unsupported network `{other}`. Supported: ethereum, bsc, polygon, bitcoin"
            )),
        }
    }
}

/// A balance for one (network, asset) pair.
///
/// `amount_raw` is the integer balance in the chain's smallest unit
/// (wei, satoshi, token base units); `amount` is the lossless decimal
/// display form. Produced fresh per query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssetQuote {
    /// Asset symbol (e.g. "ETH", "BTC", "USDT")
    pub symbol: String,
    /// Number of decimals for this asset on its chain
    pub decimals: u8,
    /// Balance in smallest units, as a decimal integer string
    pub amount_raw: String,
    /// Balance in display units
    pub amount: String,
}

impl AssetQuote {
    /// Build a quote from a raw smallest-unit amount.
    pub fn from_raw(symbol: impl Into<String>, decimals: u8, raw: u128) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            amount_raw: raw.to_string(),
            amount: crate::chains::format_units(raw, decimals),
        }
    }

    /// Raw amount as an integer. Infallible for quotes built via `from_raw`.
    pub fn raw(&self) -> u128 {
        self.amount_raw.parse().unwrap_or(0)
    }

    /// Display amount as a float, for valuation arithmetic.
    pub fn units(&self) -> f64 {
        self.raw() as f64 / 10f64.powi(self.decimals as i32)
    }
}

/// One generation of prices: USD spot prices for a symbol set plus a fiat
/// conversion multiplier, all retrieved together.
///
/// Superseded on refresh, never mutated; callers hold it behind `Arc`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PricePoint {
    /// Symbol -> USD price
    pub prices: HashMap<String, f64>,
    /// Fiat conversion source currency (e.g. "USD")
    pub fiat_from: String,
    /// Fiat conversion target currency (e.g. "NGN")
    pub fiat_to: String,
    /// Multiplier from `fiat_from` to `fiat_to`
    pub fiat_rate: f64,
    /// When this generation was retrieved from the providers
    pub fetched_at: DateTime<Utc>,
}

impl PricePoint {
    /// USD price for a symbol, if it was part of this generation.
    pub fn price_usd(&self, symbol: &str) -> Option<f64> {
        self.prices.get(&symbol.to_ascii_uppercase()).copied()
    }
}

/// Overall outcome of a portfolio valuation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PortfolioStatus {
    /// Every requested balance resolved
    Complete,
    /// Some balances failed and were excluded from the total
    Partial,
    /// Every balance query failed (e.g. all RPC networks unreachable)
    Failed,
}

/// One valued holding within a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PortfolioEntry {
    /// Wallet this holding belongs to
    pub wallet_id: String,
    /// Network the wallet lives on
    pub network: Network,
    /// Public address queried
    pub address: String,
    /// The balance quote
    #[serde(flatten)]
    pub quote: AssetQuote,
    /// Valuation in USD
    pub value_usd: f64,
    /// Valuation in the reference currency
    pub value_fiat: f64,
}

/// A balance query that failed, listed alongside the usable results.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FailedBalance {
    /// Wallet whose query failed
    pub wallet_id: String,
    /// Asset symbol that was being queried
    pub asset: String,
    /// Human-readable failure reason (e.g. "network timeout")
    pub reason: String,
}

/// Aggregated portfolio valuation.
///
/// The total only sums entries priced from the single [`PricePoint`]
/// generation recorded in `priced_at`; failed items never contribute.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PortfolioSnapshot {
    /// Complete, partial or fully failed
    pub status: PortfolioStatus,
    /// Reference currency the totals are expressed in
    pub currency: String,
    /// Total portfolio value in USD
    pub total_usd: f64,
    /// Total portfolio value in the reference currency
    pub total_fiat: f64,
    /// Individually valued holdings
    pub entries: Vec<PortfolioEntry>,
    /// Balance queries that failed, with reasons
    pub failures: Vec<FailedBalance>,
    /// Timestamp of the price generation used for every entry
    pub priced_at: Option<DateTime<Utc>>,
}
