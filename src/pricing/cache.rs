// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-through price cache with request coalescing.
//!
//! Each cache key covers one (symbol set, fiat currency) combination and
//! stores a complete [`PricePoint`] generation. Within the TTL, readers get
//! the cached generation. On expiry, exactly one caller refreshes while
//! concurrent callers wait on the per-key refresh lock and reuse its result.
//! If the refresh fails, the previous generation is served until it crosses
//! the stale ceiling, after which the failure surfaces.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use super::{PriceError, PriceFeed};
use crate::models::PricePoint;

struct Stored {
    point: PricePoint,
    fetched: Instant,
}

struct CacheEntry {
    /// Held for the duration of one upstream refresh.
    refresh: Mutex<()>,
    value: RwLock<Option<Stored>>,
}

impl CacheEntry {
    fn new() -> Self {
        Self {
            refresh: Mutex::new(()),
            value: RwLock::new(None),
        }
    }
}

/// TTL cache over a [`PriceFeed`].
pub struct PriceCache {
    feed: Arc<dyn PriceFeed>,
    ttl: Duration,
    max_stale: Duration,
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
}

impl PriceCache {
    pub fn new(feed: Arc<dyn PriceFeed>, ttl: Duration, max_stale: Duration) -> Self {
        Self {
            feed,
            ttl,
            max_stale,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// One consistent price generation for a symbol set and target currency.
    ///
    /// All prices and the fiat rate in the returned point were fetched
    /// together; callers value an entire portfolio against a single point.
    pub async fn price_point(
        &self,
        symbols: &[String],
        currency: &str,
    ) -> Result<PricePoint, PriceError> {
        let currency = currency.to_ascii_uppercase();
        let entry = self.entry_for(symbols, &currency).await;

        if let Some(point) = self.fresh_value(&entry).await {
            return Ok(point);
        }

        // Coalesce: one refresher per key, the rest wait here
        let _guard = entry.refresh.lock().await;

        // A concurrent refresher may have repopulated while we waited
        if let Some(point) = self.fresh_value(&entry).await {
            return Ok(point);
        }

        match self.fetch_generation(symbols, &currency).await {
            Ok(point) => {
                let mut slot = entry.value.write().await;
                *slot = Some(Stored {
                    point: point.clone(),
                    fetched: Instant::now(),
                });
                Ok(point)
            }
            Err(err) => {
                // Serve the previous generation while it is within the ceiling
                let slot = entry.value.read().await;
                if let Some(stored) = slot.as_ref() {
                    if stored.fetched.elapsed() <= self.max_stale {
                        warn!(
                            error = %err,
                            age_secs = stored.fetched.elapsed().as_secs(),
                            "price refresh failed, serving stale generation"
                        );
                        return Ok(stored.point.clone());
                    }
                }
                Err(err)
            }
        }
    }

    async fn entry_for(&self, symbols: &[String], currency: &str) -> Arc<CacheEntry> {
        let key = cache_key(symbols, currency);

        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                return Arc::clone(entry);
            }
        }

        let mut entries = self.entries.write().await;
        // Inserting a new key is the eviction point: drop every entry whose
        // generation is past the stale ceiling (or that never got one), so
        // the map stays bounded by the set of keys still worth serving.
        if !entries.contains_key(&key) {
            let max_stale = self.max_stale;
            entries.retain(|_, entry| match entry.value.try_read() {
                Ok(slot) => slot
                    .as_ref()
                    .is_some_and(|stored| stored.fetched.elapsed() <= max_stale),
                // Value slot locked: a refresh is storing right now, keep it
                Err(_) => true,
            });
        }
        Arc::clone(
            entries
                .entry(key)
                .or_insert_with(|| Arc::new(CacheEntry::new())),
        )
    }

    #[cfg(test)]
    async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn fresh_value(&self, entry: &CacheEntry) -> Option<PricePoint> {
        let slot = entry.value.read().await;
        slot.as_ref()
            .filter(|stored| stored.fetched.elapsed() <= self.ttl)
            .map(|stored| stored.point.clone())
    }

    async fn fetch_generation(
        &self,
        symbols: &[String],
        currency: &str,
    ) -> Result<PricePoint, PriceError> {
        let prices = self.feed.get_prices(symbols).await?;
        let fiat_rate = self.feed.get_fiat_rate("USD", currency).await?;

        Ok(PricePoint {
            prices,
            fiat_from: "USD".to_string(),
            fiat_to: currency.to_string(),
            fiat_rate,
            fetched_at: Utc::now(),
        })
    }
}

fn cache_key(symbols: &[String], currency: &str) -> String {
    let mut upper: Vec<String> = symbols.iter().map(|s| s.to_ascii_uppercase()).collect();
    upper.sort();
    upper.dedup();
    format!("{}|{currency}", upper.join(","))
}
