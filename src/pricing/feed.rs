// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upstream price providers.
//!
//! Spot prices come from a Binance-compatible `GET /ticker/price` endpoint,
//! quoted against USDT (treated as 1 USD). Fiat conversion rates come from
//! a Quidax-compatible `GET /markets/tickers/{pair}` endpoint.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::PriceError;

/// Source of spot prices and fiat conversion rates.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// USD spot price for each symbol. Fails as a whole if any symbol is
    /// unknown or the provider is unreachable.
    async fn get_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>, PriceError>;

    /// Conversion rate from one fiat currency into another.
    async fn get_fiat_rate(&self, from: &str, to: &str) -> Result<f64, PriceError>;
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

#[derive(Debug, Deserialize)]
struct FxTickerEnvelope {
    data: FxTickerData,
}

#[derive(Debug, Deserialize)]
struct FxTickerData {
    ticker: FxTicker,
}

#[derive(Debug, Deserialize)]
struct FxTicker {
    last: String,
}

/// Production [`PriceFeed`] backed by HTTP market-data providers.
pub struct MarketDataFeed {
    price_api_url: String,
    fx_api_url: String,
    http: Client,
}

impl MarketDataFeed {
    pub fn new(price_api_url: String, fx_api_url: String, http: Client) -> Self {
        Self {
            price_api_url,
            fx_api_url,
            http,
        }
    }

    async fn fetch_usdt_quote(&self, symbol: &str) -> Result<f64, PriceError> {
        let pair = format!("{}USDT", symbol.to_ascii_uppercase());
        let url = format!(
            "{}/ticker/price?symbol={pair}",
            self.price_api_url.trim_end_matches('/')
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceError::Upstream(e.to_string()))?;

        // The provider answers 4xx for symbols it does not list
        if response.status().is_client_error() {
            return Err(PriceError::UnknownAsset(symbol.to_ascii_uppercase()));
        }
        if !response.status().is_success() {
            return Err(PriceError::Upstream(format!(
                "ticker {pair}: HTTP {}",
                response.status()
            )));
        }

        let ticker: TickerPrice = response
            .json()
            .await
            .map_err(|e| PriceError::Upstream(e.to_string()))?;

        ticker
            .price
            .parse()
            .map_err(|_| PriceError::Upstream(format!("unparseable price for {pair}")))
    }
}

#[async_trait]
impl PriceFeed for MarketDataFeed {
    async fn get_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>, PriceError> {
        let mut prices = HashMap::with_capacity(symbols.len());

        for symbol in symbols {
            let upper = symbol.to_ascii_uppercase();
            if prices.contains_key(&upper) {
                continue;
            }
            // Stablecoins quoted against themselves are pegged at 1 USD
            let price = if upper == "USDT" {
                1.0
            } else {
                self.fetch_usdt_quote(&upper).await?
            };
            prices.insert(upper, price);
        }

        debug!(count = prices.len(), "fetched spot prices");
        Ok(prices)
    }

    async fn get_fiat_rate(&self, from: &str, to: &str) -> Result<f64, PriceError> {
        let from = from.to_ascii_uppercase();
        let to = to.to_ascii_uppercase();
        if from == to {
            return Ok(1.0);
        }

        // USD liquidity on the FX venue is denominated in USDT
        let base = if from == "USD" {
            "usdt".to_string()
        } else {
            from.to_ascii_lowercase()
        };
        let pair = format!("{base}{}", to.to_ascii_lowercase());
        let url = format!(
            "{}/markets/tickers/{pair}",
            self.fx_api_url.trim_end_matches('/')
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PriceError::Upstream(format!(
                "fx ticker {pair}: HTTP {}",
                response.status()
            )));
        }

        let envelope: FxTickerEnvelope = response
            .json()
            .await
            .map_err(|e| PriceError::Upstream(e.to_string()))?;

        let rate: f64 = envelope
            .data
            .ticker
            .last
            .parse()
            .map_err(|_| PriceError::Upstream(format!("unparseable rate for {pair}")))?;

        if rate <= 0.0 {
            return Err(PriceError::Upstream(format!(
                "non-positive rate for {pair}: {rate}"
            )));
        }

        debug!(%pair, rate, "fetched fiat rate");
        Ok(rate)
    }
}
