// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC balance adapter for EVM-family networks (Ethereum, BSC, Polygon).
//!
//! Native balances via `eth_getBalance`; ERC-20 balances via `eth_call`
//! with the `balanceOf(address)` selector. Responses are deserialized into
//! a strict JSON-RPC schema - no dynamic shapes.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha3::{Digest, Keccak256};

use super::{token_config, AdapterError, ChainAdapter};
use crate::models::Network;

/// `balanceOf(address)` function selector.
const BALANCE_OF_SELECTOR: &str = "0x70a08231";

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Balance adapter for one EVM network.
pub struct EvmAdapter {
    network: Network,
    rpc_url: String,
    http: Client,
}

impl EvmAdapter {
    pub fn new(network: Network, rpc_url: String, http: Client) -> Self {
        debug_assert!(network.is_evm());
        Self {
            network,
            rpc_url,
            http,
        }
    }

    /// Issue one JSON-RPC call and return the hex-quantity result.
    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<String, AdapterError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(AdapterError::Rpc {
                network: self.network,
                message: format!("HTTP {}", response.status()),
            });
        }

        let body: JsonRpcResponse = response.json().await.map_err(|e| self.transport_error(e))?;

        if let Some(err) = body.error {
            return Err(AdapterError::Rpc {
                network: self.network,
                message: format!("{} (code {})", err.message, err.code),
            });
        }

        body.result.ok_or(AdapterError::Rpc {
            network: self.network,
            message: "response carried neither result nor error".to_string(),
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> AdapterError {
        if e.is_timeout() {
            AdapterError::Timeout {
                network: self.network,
            }
        } else {
            AdapterError::Rpc {
                network: self.network,
                message: e.to_string(),
            }
        }
    }

    /// Parse a `0x`-prefixed hex quantity into a u128.
    fn parse_hex_quantity(&self, hex_str: &str) -> Result<u128, AdapterError> {
        let digits = hex_str.trim().trim_start_matches("0x");
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(0);
        }
        // u128 holds 32 hex digits; anything longer is not a plausible balance
        if digits.len() > 32 {
            return Err(AdapterError::Rpc {
                network: self.network,
                message: format!("balance exceeds supported range: {hex_str}"),
            });
        }
        u128::from_str_radix(digits, 16).map_err(|e| AdapterError::Rpc {
            network: self.network,
            message: format!("invalid hex quantity `{hex_str}`: {e}"),
        })
    }
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    fn network(&self) -> Network {
        self.network
    }

    fn validate_address(&self, address: &str) -> Result<(), AdapterError> {
        let hex_part = address
            .strip_prefix("0x")
            .ok_or_else(|| AdapterError::InvalidAddress(address.to_string()))?;
        if hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(())
        } else {
            Err(AdapterError::InvalidAddress(address.to_string()))
        }
    }

    async fn get_native_balance(&self, address: &str) -> Result<u128, AdapterError> {
        self.validate_address(address)?;
        let result = self
            .rpc_call("eth_getBalance", json!([address, "latest"]))
            .await?;
        self.parse_hex_quantity(&result)
    }

    async fn get_token_balance(&self, address: &str, asset: &str) -> Result<u128, AdapterError> {
        self.validate_address(address)?;
        let token = token_config(self.network, asset).ok_or_else(|| {
            AdapterError::UnsupportedAsset {
                asset: asset.to_ascii_uppercase(),
                network: self.network,
            }
        })?;

        // calldata: selector || address left-padded to 32 bytes
        let data = format!(
            "{BALANCE_OF_SELECTOR}{:0>64}",
            address[2..].to_ascii_lowercase()
        );
        let result = self
            .rpc_call(
                "eth_call",
                json!([{ "to": token.contract, "data": data }, "latest"]),
            )
            .await?;
        self.parse_hex_quantity(&result)
    }

    /// Derive the Ethereum-format address for a secp256k1 secret key.
    ///
    /// keccak256 of the uncompressed public key (minus the 0x04 prefix),
    /// last 20 bytes, hex-encoded with 0x prefix.
    fn derive_address(&self, secret_key: &[u8; 32]) -> Result<String, AdapterError> {
        use k256::ecdsa::SigningKey;

        let signing_key = SigningKey::from_bytes(secret_key.into())
            .map_err(|e| AdapterError::InvalidAddress(format!("invalid secret key: {e}")))?;

        let public_key = signing_key.verifying_key().to_encoded_point(false);
        let hash = Keccak256::digest(&public_key.as_bytes()[1..]);

        Ok(format!("0x{}", hex::encode(&hash[12..])))
    }

    fn asset_decimals(&self, asset: &str) -> Result<u8, AdapterError> {
        if asset.eq_ignore_ascii_case(self.network.native_symbol()) {
            return Ok(self.network.native_decimals());
        }
        token_config(self.network, asset)
            .map(|t| t.decimals)
            .ok_or_else(|| AdapterError::UnsupportedAsset {
                asset: asset.to_ascii_uppercase(),
                network: self.network,
            })
    }

    fn supported_assets(&self) -> Vec<&'static str> {
        let mut assets = vec![self.network.native_symbol()];
        assets.extend(super::evm_tokens(self.network).iter().map(|t| t.symbol));
        assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_adapter() -> EvmAdapter {
        EvmAdapter::new(
            Network::Ethereum,
            "http://localhost:0".to_string(),
            Client::new(),
        )
    }

    #[test]
    fn address_validation_fails_fast() {
        let adapter = test_adapter();
        assert!(adapter
            .validate_address("0xdAC17F958D2ee523a2206206994597C13D831ec7")
            .is_ok());

        for bad in [
            "dAC17F958D2ee523a2206206994597C13D831ec7", // no 0x
            "0x1234",                                   // too short
            "0xZZC17F958D2ee523a2206206994597C13D831e",  // non-hex
            "",
        ] {
            assert!(
                matches!(
                    adapter.validate_address(bad),
                    Err(AdapterError::InvalidAddress(_))
                ),
                "expected invalid: {bad}"
            );
        }
    }

    #[test]
    fn hex_quantity_parsing() {
        let adapter = test_adapter();
        assert_eq!(adapter.parse_hex_quantity("0x0").unwrap(), 0);
        assert_eq!(adapter.parse_hex_quantity("0x").unwrap(), 0);
        assert_eq!(
            adapter.parse_hex_quantity("0x1bc16d674ec80000").unwrap(),
            2_000_000_000_000_000_000 // 2 ETH in wei
        );
        // 32-byte zero-padded eth_call result
        let padded = format!("0x{:0>64}", "de0b6b3a7640000");
        assert_eq!(
            adapter.parse_hex_quantity(&padded).unwrap(),
            1_000_000_000_000_000_000
        );
        assert!(adapter.parse_hex_quantity("0xnothex").is_err());
    }

    #[test]
    fn derive_address_is_deterministic_and_well_formed() {
        let adapter = test_adapter();
        let secret = crate::chains::generate_secret_key();

        let a = adapter.derive_address(&secret).unwrap();
        let b = adapter.derive_address(&secret).unwrap();
        assert_eq!(a, b);

        assert!(a.starts_with("0x"));
        assert_eq!(a.len(), 42);
        assert!(a[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn derive_address_matches_known_vector() {
        // Private key 0x...01 maps to a well-known address
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let adapter = test_adapter();
        assert_eq!(
            adapter.derive_address(&secret).unwrap(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn derivation_survives_vault_round_trip() {
        let vault = crate::vault::KeyVault::new(b"01234567890123456789012345678901");
        let secret = crate::chains::generate_secret_key();

        let blob = vault.encrypt(&secret).unwrap();
        let decrypted = vault.decrypt(&blob).unwrap();
        let recovered: [u8; 32] = decrypted.as_slice().try_into().unwrap();

        let adapter = test_adapter();
        assert_eq!(
            adapter.derive_address(&secret).unwrap(),
            adapter.derive_address(&recovered).unwrap()
        );
    }

    #[test]
    fn unsupported_token_is_rejected_without_network_call() {
        let adapter = test_adapter();
        assert!(matches!(
            adapter.asset_decimals("DOGE"),
            Err(AdapterError::UnsupportedAsset { .. })
        ));
        assert_eq!(adapter.asset_decimals("ETH").unwrap(), 18);
        assert_eq!(adapter.asset_decimals("usdt").unwrap(), 6);
    }

    #[test]
    fn supported_assets_lists_native_first() {
        let assets = test_adapter().supported_assets();
        assert_eq!(assets[0], "ETH");
        assert!(assets.contains(&"USDT"));
        assert!(assets.contains(&"USDC"));
    }
}
