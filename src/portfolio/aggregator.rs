// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Concurrent balance fan-out.
//!
//! One query per (wallet, asset) pair, capped by a semaphore and bounded
//! by a per-call timeout. A batch never fails as a whole: each query
//! resolves to a quote or a recorded failure.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::chains::{fetch_balance, AdapterError, AdapterRegistry};
use crate::models::{AssetQuote, FailedBalance, Network};
use crate::storage::WalletRecord;

/// One successfully quoted (wallet, asset) balance.
#[derive(Debug, Clone)]
pub struct WalletBalance {
    pub wallet_id: String,
    pub network: Network,
    pub address: String,
    pub quote: AssetQuote,
}

/// Outcome of one aggregation pass.
#[derive(Debug, Default)]
pub struct BalanceBatch {
    pub balances: Vec<WalletBalance>,
    pub failures: Vec<FailedBalance>,
}

impl BalanceBatch {
    /// True when every query in a non-empty batch failed.
    pub fn all_failed(&self) -> bool {
        self.balances.is_empty() && !self.failures.is_empty()
    }

    /// Distinct asset symbols present in the successful balances.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .balances
            .iter()
            .map(|b| b.quote.symbol.clone())
            .collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }
}

/// Fans balance queries out across chain adapters.
pub struct BalanceAggregator {
    registry: Arc<AdapterRegistry>,
    concurrency: usize,
    timeout: Duration,
}

impl BalanceAggregator {
    pub fn new(registry: Arc<AdapterRegistry>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            registry,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Query one asset balance for one wallet, with the batch timeout.
    pub async fn fetch_one(
        &self,
        record: &WalletRecord,
        asset: &str,
    ) -> Result<AssetQuote, AdapterError> {
        let adapter = self.registry.get(record.network);
        let decimals = adapter.asset_decimals(asset)?;

        let raw = tokio::time::timeout(
            self.timeout,
            fetch_balance(adapter.as_ref(), &record.address, asset),
        )
        .await
        .map_err(|_| AdapterError::Timeout {
            network: record.network,
        })??;

        Ok(AssetQuote::from_raw(
            &asset.to_ascii_uppercase(),
            decimals,
            raw,
        ))
    }

    /// Query every supported asset for every wallet concurrently.
    ///
    /// A failing query degrades to a [`FailedBalance`]; the rest of the
    /// batch completes normally.
    pub async fn fetch_all(&self, wallets: &[WalletRecord]) -> BalanceBatch {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        for record in wallets {
            let adapter = self.registry.get(record.network);
            for asset in adapter.supported_assets() {
                let semaphore = Arc::clone(&semaphore);
                let adapter = Arc::clone(&adapter);
                let wallet_id = record.wallet_id.clone();
                let network = record.network;
                let address = record.address.clone();
                let asset = asset.to_string();
                let timeout = self.timeout;

                join_set.spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            let err = AdapterError::Rpc {
                                network,
                                message: "aggregator shut down".to_string(),
                            };
                            return (wallet_id, network, address, asset, Err(err));
                        }
                    };

                    let result = match adapter.asset_decimals(&asset) {
                        Ok(decimals) => {
                            match tokio::time::timeout(
                                timeout,
                                fetch_balance(adapter.as_ref(), &address, &asset),
                            )
                            .await
                            {
                                Ok(Ok(raw)) => Ok(AssetQuote::from_raw(&asset, decimals, raw)),
                                Ok(Err(e)) => Err(e),
                                Err(_) => Err(AdapterError::Timeout { network }),
                            }
                        }
                        Err(e) => Err(e),
                    };
                    (wallet_id, network, address, asset, result)
                });
            }
        }

        let mut batch = BalanceBatch::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((wallet_id, network, address, _asset, Ok(quote))) => {
                    batch.balances.push(WalletBalance {
                        wallet_id,
                        network,
                        address,
                        quote,
                    });
                }
                Ok((wallet_id, network, _address, asset, Err(err))) => {
                    warn!(%wallet_id, %network, %asset, error = %err, "balance query failed");
                    batch.failures.push(FailedBalance {
                        wallet_id,
                        asset,
                        reason: err.to_string(),
                    });
                }
                Err(join_err) => {
                    warn!(error = %join_err, "balance task aborted");
                }
            }
        }

        // Deterministic output order regardless of completion order
        batch
            .balances
            .sort_by(|a, b| (&a.wallet_id, &a.quote.symbol).cmp(&(&b.wallet_id, &b.quote.symbol)));
        batch
            .failures
            .sort_by(|a, b| (&a.wallet_id, &a.asset).cmp(&(&b.wallet_id, &b.asset)));
        batch
    }
}
