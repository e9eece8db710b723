// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fiat valuation of an aggregated balance batch.
//!
//! Exactly one aggregation pass and one price generation per snapshot:
//! every entry is valued against the same [`crate::models::PricePoint`],
//! so a snapshot is internally consistent even while markets move.

use std::sync::Arc;

use crate::models::{FailedBalance, PortfolioEntry, PortfolioSnapshot, PortfolioStatus};
use crate::pricing::{PriceCache, PriceError};
use crate::storage::WalletRecord;

use super::BalanceAggregator;

pub struct PortfolioValuator {
    aggregator: Arc<BalanceAggregator>,
    prices: Arc<PriceCache>,
}

impl PortfolioValuator {
    pub fn new(aggregator: Arc<BalanceAggregator>, prices: Arc<PriceCache>) -> Self {
        Self { aggregator, prices }
    }

    /// Aggregate, price and total the given wallets in one pass.
    ///
    /// Balance failures degrade the snapshot (`Partial`, or `Failed` when
    /// nothing resolved); a price-layer failure is the only hard error.
    pub async fn value_portfolio(
        &self,
        wallets: &[WalletRecord],
        currency: &str,
    ) -> Result<PortfolioSnapshot, PriceError> {
        let batch = self.aggregator.fetch_all(wallets).await;

        // Nothing to price: empty portfolio, or every query failed
        if batch.balances.is_empty() {
            let status = if batch.failures.is_empty() {
                PortfolioStatus::Complete
            } else {
                PortfolioStatus::Failed
            };
            return Ok(PortfolioSnapshot {
                status,
                currency: currency.to_ascii_uppercase(),
                total_usd: 0.0,
                total_fiat: 0.0,
                entries: Vec::new(),
                failures: batch.failures,
                priced_at: None,
            });
        }

        let point = self.prices.price_point(&batch.symbols(), currency).await?;

        let mut entries = Vec::with_capacity(batch.balances.len());
        let mut failures = batch.failures;

        for balance in batch.balances {
            match point.price_usd(&balance.quote.symbol) {
                Some(price) => {
                    let value_usd = balance.quote.units() * price;
                    entries.push(PortfolioEntry {
                        wallet_id: balance.wallet_id,
                        network: balance.network,
                        address: balance.address,
                        value_usd,
                        value_fiat: value_usd * point.fiat_rate,
                        quote: balance.quote,
                    });
                }
                None => failures.push(FailedBalance {
                    wallet_id: balance.wallet_id,
                    asset: balance.quote.symbol,
                    reason: "asset missing from price generation".to_string(),
                }),
            }
        }

        let total_usd: f64 = entries.iter().map(|e| e.value_usd).sum();
        let total_fiat: f64 = entries.iter().map(|e| e.value_fiat).sum();
        let status = if failures.is_empty() {
            PortfolioStatus::Complete
        } else {
            PortfolioStatus::Partial
        };

        Ok(PortfolioSnapshot {
            status,
            currency: point.fiat_to.clone(),
            total_usd,
            total_fiat,
            entries,
            failures,
            priced_at: Some(point.fetched_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::chains::{AdapterRegistry, ChainAdapter};
    use crate::models::Network;
    use crate::portfolio::aggregator::tests::{record, StubAdapter};
    use crate::pricing::PriceFeed;

    struct StubFeed {
        prices: HashMap<String, f64>,
        rate: f64,
        fetches: AtomicUsize,
    }

    impl StubFeed {
        fn new(prices: &[(&str, f64)], rate: f64) -> Arc<Self> {
            Arc::new(Self {
                prices: prices
                    .iter()
                    .map(|(s, p)| (s.to_string(), *p))
                    .collect(),
                rate,
                fetches: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PriceFeed for StubFeed {
        async fn get_prices(
            &self,
            symbols: &[String],
        ) -> Result<HashMap<String, f64>, PriceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(symbols
                .iter()
                .filter_map(|s| {
                    let upper = s.to_ascii_uppercase();
                    self.prices.get(&upper).map(|p| (upper, *p))
                })
                .collect())
        }

        async fn get_fiat_rate(&self, _from: &str, _to: &str) -> Result<f64, PriceError> {
            Ok(self.rate)
        }
    }

    fn valuator(
        adapters: Vec<Arc<dyn ChainAdapter>>,
        feed: Arc<StubFeed>,
    ) -> PortfolioValuator {
        let registry = Arc::new(AdapterRegistry::from_adapters(adapters));
        let aggregator = Arc::new(BalanceAggregator::new(
            registry,
            10,
            Duration::from_secs(5),
        ));
        let cache = Arc::new(PriceCache::new(
            feed,
            Duration::from_secs(30),
            Duration::from_secs(300),
        ));
        PortfolioValuator::new(aggregator, cache)
    }

    #[tokio::test]
    async fn values_holdings_in_usd_and_fiat() {
        // 2 ETH at 3000 USD and 1500 NGN/USD = 9,000,000 NGN
        let eth = StubAdapter::new(Network::Ethereum)
            .with_balance("ETH", 2_000_000_000_000_000_000);
        let feed = StubFeed::new(&[("ETH", 3000.0)], 1500.0);
        let valuator = valuator(vec![Arc::new(eth)], feed);

        let snapshot = valuator
            .value_portfolio(&[record("w-1", Network::Ethereum)], "NGN")
            .await
            .unwrap();

        assert_eq!(snapshot.status, PortfolioStatus::Complete);
        assert_eq!(snapshot.currency, "NGN");
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].value_usd, 6000.0);
        assert_eq!(snapshot.entries[0].value_fiat, 9_000_000.0);
        assert_eq!(snapshot.total_usd, 6000.0);
        assert_eq!(snapshot.total_fiat, 9_000_000.0);
        assert!(snapshot.priced_at.is_some());
    }

    #[tokio::test]
    async fn zero_balance_values_to_zero_not_error() {
        let btc = StubAdapter::new(Network::Bitcoin).with_balance("BTC", 0);
        let feed = StubFeed::new(&[("BTC", 65000.0)], 1500.0);
        let valuator = valuator(vec![Arc::new(btc)], feed);

        let snapshot = valuator
            .value_portfolio(&[record("w-btc", Network::Bitcoin)], "NGN")
            .await
            .unwrap();

        assert_eq!(snapshot.status, PortfolioStatus::Complete);
        assert_eq!(snapshot.entries[0].quote.amount, "0");
        assert_eq!(snapshot.total_usd, 0.0);
    }

    #[tokio::test]
    async fn failed_chain_degrades_to_partial_and_is_excluded() {
        let eth = StubAdapter::new(Network::Ethereum)
            .with_balance("ETH", 1_000_000_000_000_000_000);
        let btc = StubAdapter::new(Network::Bitcoin).with_failure("BTC");
        let feed = StubFeed::new(&[("ETH", 3000.0), ("BTC", 65000.0)], 1500.0);
        let valuator = valuator(vec![Arc::new(eth), Arc::new(btc)], feed.clone());

        let snapshot = valuator
            .value_portfolio(
                &[
                    record("w-eth", Network::Ethereum),
                    record("w-btc", Network::Bitcoin),
                ],
                "NGN",
            )
            .await
            .unwrap();

        assert_eq!(snapshot.status, PortfolioStatus::Partial);
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.failures.len(), 1);
        // The failed holding contributes nothing to the totals
        assert_eq!(snapshot.total_usd, 3000.0);
        // One price generation for the whole pass
        assert_eq!(feed.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_timeout_of_three_totals_the_survivors() {
        let eth = StubAdapter::new(Network::Ethereum)
            .with_balance("ETH", 1_000_000_000_000_000_000);
        let btc = StubAdapter::new(Network::Bitcoin).with_balance("BTC", 100_000_000);
        let slow = StubAdapter::new(Network::Polygon)
            .with_balance("MATIC", 1_000_000_000_000_000_000)
            .with_delay(Duration::from_secs(60));
        let feed = StubFeed::new(&[("ETH", 3000.0), ("BTC", 65000.0), ("MATIC", 0.5)], 1500.0);
        let valuator = valuator(
            vec![Arc::new(eth), Arc::new(btc), Arc::new(slow)],
            feed.clone(),
        );

        let snapshot = valuator
            .value_portfolio(
                &[
                    record("w-eth", Network::Ethereum),
                    record("w-btc", Network::Bitcoin),
                    record("w-matic", Network::Polygon),
                ],
                "NGN",
            )
            .await
            .unwrap();

        assert_eq!(snapshot.status, PortfolioStatus::Partial);
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.failures.len(), 1);
        assert_eq!(snapshot.failures[0].wallet_id, "w-matic");
        // 1 ETH * 3000 + 1 BTC * 65000; the timed-out MATIC contributes nothing
        assert_eq!(snapshot.total_usd, 68_000.0);
        assert_eq!(snapshot.total_fiat, 102_000_000.0);
    }

    #[tokio::test]
    async fn fully_failed_batch_is_marked_failed_without_pricing() {
        let eth = StubAdapter::new(Network::Ethereum).with_failure("ETH");
        let feed = StubFeed::new(&[("ETH", 3000.0)], 1500.0);
        let valuator = valuator(vec![Arc::new(eth)], feed.clone());

        let snapshot = valuator
            .value_portfolio(&[record("w-1", Network::Ethereum)], "NGN")
            .await
            .unwrap();

        assert_eq!(snapshot.status, PortfolioStatus::Failed);
        assert!(snapshot.entries.is_empty());
        assert!(snapshot.priced_at.is_none());
        assert_eq!(feed.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_portfolio_is_complete_and_zero() {
        let feed = StubFeed::new(&[], 1500.0);
        let valuator = valuator(
            vec![Arc::new(StubAdapter::new(Network::Ethereum))],
            feed.clone(),
        );

        let snapshot = valuator.value_portfolio(&[], "NGN").await.unwrap();

        assert_eq!(snapshot.status, PortfolioStatus::Complete);
        assert_eq!(snapshot.total_fiat, 0.0);
        assert!(snapshot.entries.is_empty());
        assert_eq!(feed.fetches.load(Ordering::SeqCst), 0);
    }
}
