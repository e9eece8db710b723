// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Price discovery.
//!
//! [`PriceFeed`] abstracts the upstream market-data and FX providers;
//! [`PriceCache`] sits in front of it and bounds both request rate and
//! staleness. Everything downstream consumes [`crate::models::PricePoint`]
//! snapshots, never live quotes.

pub mod cache;
pub mod feed;

pub use cache::PriceCache;
pub use feed::{MarketDataFeed, PriceFeed};

/// Errors produced by the price layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PriceError {
    /// Asset symbol the provider does not quote
    #[error("no market price for asset: {0}")]
    UnknownAsset(String),

    /// Upstream unreachable and no cached generation within the stale ceiling
    #[error("price data unavailable: {0}")]
    Unavailable(String),

    /// Provider transport or protocol failure
    #[error("price provider error: {0}")]
    Upstream(String),
}
