// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state wired once at startup.

use std::sync::Arc;

use crate::chains::AdapterRegistry;
use crate::config::AppConfig;
use crate::portfolio::{BalanceAggregator, PortfolioValuator};
use crate::pricing::{MarketDataFeed, PriceCache};
use crate::storage::{DocumentStore, StoragePaths, StorageError};
use crate::vault::KeyVault;

/// Errors raised while assembling the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to initialize storage: {0}")]
    Storage(#[from] StorageError),
}

/// Engine components shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<DocumentStore>,
    pub vault: Arc<KeyVault>,
    pub registry: Arc<AdapterRegistry>,
    pub valuator: Arc<PortfolioValuator>,
    pub aggregator: Arc<BalanceAggregator>,
    pub prices: Arc<PriceCache>,
}

impl AppState {
    /// Wire every component from configuration.
    pub fn from_config(config: AppConfig) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .timeout(config.rpc_timeout)
            .build()?;

        let mut store = DocumentStore::new(StoragePaths::new(&config.data_dir));
        store.initialize()?;

        let vault = Arc::new(KeyVault::new(&config.encryption_key));
        let registry = Arc::new(AdapterRegistry::from_config(&config, http.clone()));

        let feed = Arc::new(MarketDataFeed::new(
            config.price_api_url.clone(),
            config.fx_api_url.clone(),
            http,
        ));
        let prices = Arc::new(PriceCache::new(
            feed,
            config.price_ttl,
            config.price_max_stale,
        ));

        let aggregator = Arc::new(BalanceAggregator::new(
            Arc::clone(&registry),
            config.balance_concurrency,
            config.rpc_timeout,
        ));
        let valuator = Arc::new(PortfolioValuator::new(
            Arc::clone(&aggregator),
            Arc::clone(&prices),
        ));

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            vault,
            registry,
            valuator,
            aggregator,
            prices,
        })
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }
}
