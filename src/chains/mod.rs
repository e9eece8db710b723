// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain adapters.
//!
//! One [`ChainAdapter`] implementation per network family:
//! - [`EvmAdapter`] - Ethereum, BSC and Polygon over JSON-RPC
//! - [`BitcoinAdapter`] - Bitcoin over a Blockstream-style REST API
//!
//! Adapters are deliberately thin: they validate input, make a single
//! network call and convert units. Retry and timeout policy lives in the
//! balance aggregator.

pub mod bitcoin;
pub mod evm;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::models::Network;

pub use bitcoin::BitcoinAdapter;
pub use evm::EvmAdapter;

/// Errors produced by chain adapters.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError {
    /// Malformed address, rejected before any network call
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Asset symbol not configured for this network
    #[error("asset {asset} is not supported on {network}")]
    UnsupportedAsset { asset: String, network: Network },

    /// The RPC endpoint did not respond within the bounded interval
    #[error("network timeout querying {network}")]
    Timeout { network: Network },

    /// RPC transport or protocol error
    #[error("rpc error on {network}: {message}")]
    Rpc { network: Network, message: String },
}

/// Capability interface for querying balances on one network.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// The network this adapter serves.
    fn network(&self) -> Network;

    /// Validate an address for this network. Fails fast, no network call.
    fn validate_address(&self, address: &str) -> Result<(), AdapterError>;

    /// Native balance in the chain's smallest unit (wei, satoshi).
    async fn get_native_balance(&self, address: &str) -> Result<u128, AdapterError>;

    /// Token balance in the token's base units.
    async fn get_token_balance(&self, address: &str, asset: &str) -> Result<u128, AdapterError>;

    /// Derive the public address for a decrypted 32-byte secret key.
    fn derive_address(&self, secret_key: &[u8; 32]) -> Result<String, AdapterError>;

    /// Decimal count for an asset on this network.
    fn asset_decimals(&self, asset: &str) -> Result<u8, AdapterError>;

    /// Asset symbols this adapter can quote, native first.
    fn supported_assets(&self) -> Vec<&'static str>;
}

/// Dispatch a balance query by asset symbol (native or token).
pub async fn fetch_balance(
    adapter: &dyn ChainAdapter,
    address: &str,
    asset: &str,
) -> Result<u128, AdapterError> {
    if asset.eq_ignore_ascii_case(adapter.network().native_symbol()) {
        adapter.get_native_balance(address).await
    } else {
        adapter.get_token_balance(address, asset).await
    }
}

/// ERC-20 token deployment on one network.
#[derive(Debug, Clone, Copy)]
pub struct TokenConfig {
    pub symbol: &'static str,
    pub contract: &'static str,
    pub decimals: u8,
}

/// Known stablecoin deployments per EVM network.
pub fn evm_tokens(network: Network) -> &'static [TokenConfig] {
    match network {
        Network::Ethereum => &[
            TokenConfig {
                symbol: "USDT",
                contract: "0xdAC17F958D2ee523a2206206994597C13D831ec7",
                decimals: 6,
            },
            TokenConfig {
                symbol: "USDC",
                contract: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
                decimals: 6,
            },
        ],
        Network::Bsc => &[
            TokenConfig {
                symbol: "USDT",
                contract: "0x55d398326f99059fF775485246999027B3197955",
                decimals: 18,
            },
            TokenConfig {
                symbol: "USDC",
                contract: "0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d",
                decimals: 18,
            },
        ],
        Network::Polygon => &[
            TokenConfig {
                symbol: "USDT",
                contract: "0xc2132D05D31c914a87C6611C10748AEb04B58e8F",
                decimals: 6,
            },
            TokenConfig {
                symbol: "USDC",
                contract: "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359",
                decimals: 6,
            },
        ],
        Network::Bitcoin => &[],
    }
}

/// Look up a token deployment by symbol, case-insensitively.
pub fn token_config(network: Network, asset: &str) -> Option<&'static TokenConfig> {
    evm_tokens(network)
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(asset))
}

/// Generate a fresh secp256k1 secret key.
///
/// A single 32-byte scalar is valid key material for every supported
/// network; each adapter derives its own address format from it.
pub fn generate_secret_key() -> [u8; 32] {
    use k256::ecdsa::SigningKey;
    use rand_core::OsRng;

    let signing_key = SigningKey::random(&mut OsRng);
    signing_key.to_bytes().into()
}

/// Holds one adapter per supported network.
pub struct AdapterRegistry {
    adapters: HashMap<Network, Arc<dyn ChainAdapter>>,
}

impl AdapterRegistry {
    /// Build adapters for every supported network from configuration.
    pub fn from_config(config: &AppConfig, http: reqwest::Client) -> Self {
        let mut adapters: HashMap<Network, Arc<dyn ChainAdapter>> = HashMap::new();

        for network in [Network::Ethereum, Network::Bsc, Network::Polygon] {
            adapters.insert(
                network,
                Arc::new(EvmAdapter::new(
                    network,
                    config.rpc_url(network).to_string(),
                    http.clone(),
                )),
            );
        }
        adapters.insert(
            Network::Bitcoin,
            Arc::new(BitcoinAdapter::new(
                config.bitcoin_api_url.clone(),
                http.clone(),
            )),
        );

        Self { adapters }
    }

    /// Build a registry from explicit adapters.
    #[cfg(test)]
    pub(crate) fn from_adapters(list: Vec<Arc<dyn ChainAdapter>>) -> Self {
        Self {
            adapters: list.into_iter().map(|a| (a.network(), a)).collect(),
        }
    }

    /// Adapter for a network. Every supported network is registered.
    pub fn get(&self, network: Network) -> Arc<dyn ChainAdapter> {
        Arc::clone(
            self.adapters
                .get(&network)
                .expect("adapter registered for every supported network"),
        )
    }

    /// Sorted union of asset symbols quoted across all networks.
    pub fn supported_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .adapters
            .values()
            .flat_map(|a| a.supported_assets())
            .map(String::from)
            .collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }
}

/// Format a smallest-unit amount as a decimal string.
///
/// Lossless: the full fractional part is kept (minus trailing zeros) so
/// that [`parse_units`] recovers the exact integer.
pub fn format_units(raw: u128, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }

    let divisor = 10u128.pow(decimals as u32);
    let whole = raw / divisor;
    let remainder = raw % divisor;

    if remainder == 0 {
        whole.to_string()
    } else {
        let frac = format!("{remainder:0>width$}", width = decimals as usize);
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }
}

/// Parse a decimal display string back into smallest units.
///
/// Inverse of [`format_units`]; rejects malformed input and fractional
/// parts longer than the asset's decimal count.
pub fn parse_units(display: &str, decimals: u8) -> Result<u128, String> {
    let display = display.trim();
    let (whole_str, frac_str) = match display.split_once('.') {
        Some((w, f)) => (w, f),
        None => (display, ""),
    };

    if whole_str.is_empty() && frac_str.is_empty() {
        return Err("empty amount".to_string());
    }
    if frac_str.len() > decimals as usize {
        return Err(format!(
            "fractional part exceeds {decimals} decimals: {display}"
        ));
    }

    let whole: u128 = if whole_str.is_empty() {
        0
    } else {
        whole_str
            .parse()
            .map_err(|_| format!("invalid amount: {display}"))?
    };

    let frac: u128 = if frac_str.is_empty() {
        0
    } else {
        let padded = format!("{frac_str:0<width$}", width = decimals as usize);
        padded
            .parse()
            .map_err(|_| format!("invalid amount: {display}"))?
    };

    let divisor = 10u128.pow(decimals as u32);
    whole
        .checked_mul(divisor)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| format!("amount out of range: {display}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_units_basics() {
        // 1 ETH = 1e18 wei
        assert_eq!(format_units(1_000_000_000_000_000_000, 18), "1");
        // 0.5 ETH
        assert_eq!(format_units(500_000_000_000_000_000, 18), "0.5");
        // 1 satoshi
        assert_eq!(format_units(1, 8), "0.00000001");
        // 1 USDC = 1e6
        assert_eq!(format_units(1_000_000, 6), "1");
        // Zero
        assert_eq!(format_units(0, 18), "0");
    }

    #[test]
    fn format_is_lossless_not_truncated() {
        // 1.234567890123456789 ETH keeps all 18 fractional digits
        assert_eq!(
            format_units(1_234_567_890_123_456_789, 18),
            "1.234567890123456789"
        );
    }

    #[test]
    fn round_trip_law_across_network_decimals() {
        let cases: &[(u128, u8)] = &[
            (0, 18),
            (1, 18),
            (2_000_000_000_000_000_000, 18),
            (1_234_567_890_123_456_789, 18),
            (u128::from(u64::MAX), 18),
            (0, 8),
            (1, 8),
            (2_100_000_000_000_000, 8), // 21M BTC in satoshis
            (123_456_789, 8),
            (1_000_000, 6),
            (42, 0),
        ];
        for &(raw, decimals) in cases {
            let display = format_units(raw, decimals);
            assert_eq!(
                parse_units(&display, decimals).unwrap(),
                raw,
                "round trip failed for {raw} with {decimals} decimals"
            );
        }
    }

    #[test]
    fn parse_units_rejects_garbage() {
        assert!(parse_units("", 18).is_err());
        assert!(parse_units(".", 18).is_err());
        assert!(parse_units("abc", 18).is_err());
        assert!(parse_units("1.2.3", 18).is_err());
        // More fractional digits than the asset has
        assert!(parse_units("0.123456789", 8).is_err());
    }

    #[test]
    fn parse_units_accepts_bare_fraction() {
        assert_eq!(parse_units("0.5", 8).unwrap(), 50_000_000);
        assert_eq!(parse_units(".5", 8).unwrap(), 50_000_000);
    }

    #[test]
    fn token_lookup_is_case_insensitive() {
        let usdt = token_config(Network::Ethereum, "usdt").unwrap();
        assert_eq!(usdt.decimals, 6);
        // BSC stablecoins use 18 decimals
        assert_eq!(token_config(Network::Bsc, "USDT").unwrap().decimals, 18);
        assert!(token_config(Network::Bitcoin, "USDT").is_none());
    }

    #[test]
    fn generated_keys_are_unique() {
        let a = generate_secret_key();
        let b = generate_secret_key();
        assert_ne!(a, b);
    }
}
