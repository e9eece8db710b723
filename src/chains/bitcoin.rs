// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! REST balance adapter for Bitcoin.
//!
//! Queries a Blockstream-style `GET /address/{addr}` endpoint and computes
//! the confirmed+mempool balance as funded minus spent output sums, in
//! satoshis. Bitcoin has no token assets; token queries are rejected.

use async_trait::async_trait;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, Network as BtcNetwork, PrivateKey};
use reqwest::Client;
use serde::Deserialize;

use super::{AdapterError, ChainAdapter};
use crate::models::Network;

/// Output-sum statistics for one address, as reported by the API.
#[derive(Debug, Default, Deserialize)]
struct TxoStats {
    #[serde(default)]
    funded_txo_sum: u64,
    #[serde(default)]
    spent_txo_sum: u64,
}

/// Address summary: confirmed chain stats plus unconfirmed mempool stats.
#[derive(Debug, Deserialize)]
struct AddressStats {
    #[serde(default)]
    chain_stats: TxoStats,
    #[serde(default)]
    mempool_stats: TxoStats,
}

/// Balance adapter for the Bitcoin network.
pub struct BitcoinAdapter {
    api_url: String,
    http: Client,
}

impl BitcoinAdapter {
    pub fn new(api_url: String, http: Client) -> Self {
        Self { api_url, http }
    }

    fn transport_error(&self, e: reqwest::Error) -> AdapterError {
        if e.is_timeout() {
            AdapterError::Timeout {
                network: Network::Bitcoin,
            }
        } else {
            AdapterError::Rpc {
                network: Network::Bitcoin,
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ChainAdapter for BitcoinAdapter {
    fn network(&self) -> Network {
        Network::Bitcoin
    }

    fn validate_address(&self, address: &str) -> Result<(), AdapterError> {
        address
            .parse::<Address<_>>()
            .map_err(|_| AdapterError::InvalidAddress(address.to_string()))?
            .require_network(BtcNetwork::Bitcoin)
            .map_err(|_| AdapterError::InvalidAddress(address.to_string()))?;
        Ok(())
    }

    async fn get_native_balance(&self, address: &str) -> Result<u128, AdapterError> {
        self.validate_address(address)?;

        let url = format!("{}/address/{}", self.api_url.trim_end_matches('/'), address);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(AdapterError::Rpc {
                network: Network::Bitcoin,
                message: format!("HTTP {}", response.status()),
            });
        }

        let stats: AddressStats = response.json().await.map_err(|e| self.transport_error(e))?;

        let funded =
            stats.chain_stats.funded_txo_sum as u128 + stats.mempool_stats.funded_txo_sum as u128;
        let spent =
            stats.chain_stats.spent_txo_sum as u128 + stats.mempool_stats.spent_txo_sum as u128;

        Ok(funded.saturating_sub(spent))
    }

    async fn get_token_balance(&self, _address: &str, asset: &str) -> Result<u128, AdapterError> {
        Err(AdapterError::UnsupportedAsset {
            asset: asset.to_ascii_uppercase(),
            network: Network::Bitcoin,
        })
    }

    /// Derive the P2WPKH (native segwit) address for a secret key.
    fn derive_address(&self, secret_key: &[u8; 32]) -> Result<String, AdapterError> {
        let private_key = PrivateKey::from_slice(secret_key, BtcNetwork::Bitcoin)
            .map_err(|e| AdapterError::InvalidAddress(format!("invalid secret key: {e}")))?;

        let secp = Secp256k1::new();
        let public_key = private_key.public_key(&secp);

        let address = Address::p2wpkh(&public_key, BtcNetwork::Bitcoin)
            .map_err(|e| AdapterError::InvalidAddress(format!("address derivation: {e}")))?;

        Ok(address.to_string())
    }

    fn asset_decimals(&self, asset: &str) -> Result<u8, AdapterError> {
        if asset.eq_ignore_ascii_case("BTC") {
            Ok(8)
        } else {
            Err(AdapterError::UnsupportedAsset {
                asset: asset.to_ascii_uppercase(),
                network: Network::Bitcoin,
            })
        }
    }

    fn supported_assets(&self) -> Vec<&'static str> {
        vec!["BTC"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_adapter() -> BitcoinAdapter {
        BitcoinAdapter::new("http://localhost:0".to_string(), Client::new())
    }

    #[test]
    fn validates_mainnet_addresses() {
        let adapter = test_adapter();
        // Genesis block coinbase address (P2PKH)
        assert!(adapter
            .validate_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa")
            .is_ok());
        // Native segwit
        assert!(adapter
            .validate_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4")
            .is_ok());

        assert!(matches!(
            adapter.validate_address("not-an-address"),
            Err(AdapterError::InvalidAddress(_))
        ));
        // Testnet address must be rejected on mainnet
        assert!(matches!(
            adapter.validate_address("tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx"),
            Err(AdapterError::InvalidAddress(_))
        ));
    }

    #[test]
    fn derive_address_is_deterministic_segwit() {
        let adapter = test_adapter();
        let secret = crate::chains::generate_secret_key();

        let a = adapter.derive_address(&secret).unwrap();
        let b = adapter.derive_address(&secret).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("bc1"));
        // A derived address must itself validate
        adapter.validate_address(&a).unwrap();
    }

    #[test]
    fn token_queries_are_unsupported() {
        let adapter = test_adapter();
        assert!(matches!(
            adapter.asset_decimals("USDT"),
            Err(AdapterError::UnsupportedAsset { .. })
        ));
        assert_eq!(adapter.asset_decimals("btc").unwrap(), 8);
    }

    #[test]
    fn address_stats_balance_math() {
        let stats: AddressStats = serde_json::from_str(
            r#"{
                "chain_stats": {"funded_txo_sum": 150000, "spent_txo_sum": 50000},
                "mempool_stats": {"funded_txo_sum": 10000, "spent_txo_sum": 0}
            }"#,
        )
        .unwrap();
        let funded =
            stats.chain_stats.funded_txo_sum as u128 + stats.mempool_stats.funded_txo_sum as u128;
        let spent =
            stats.chain_stats.spent_txo_sum as u128 + stats.mempool_stats.spent_txo_sum as u128;
        assert_eq!(funded.saturating_sub(spent), 110_000);
    }

    #[test]
    fn missing_stats_default_to_zero() {
        let stats: AddressStats = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(stats.chain_stats.funded_txo_sum, 0);
        assert_eq!(stats.mempool_stats.spent_txo_sum, 0);
    }
}
