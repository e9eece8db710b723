// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Immutable configuration built once at startup from the environment and
//! passed by reference into the engine components. No ambient globals.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory for the wallet document store | `./data` |
//! | `WALLET_ENC_KEY` | Symmetric encryption key (64-char hex or >= 16-char passphrase) | Required, no default |
//! | `ETHEREUM_RPC_URL` | Ethereum JSON-RPC endpoint | `https://eth.llamarpc.com` |
//! | `BSC_RPC_URL` | BSC JSON-RPC endpoint | `https://bsc-dataseed.binance.org` |
//! | `POLYGON_RPC_URL` | Polygon JSON-RPC endpoint | `https://polygon-rpc.com` |
//! | `BITCOIN_API_URL` | Bitcoin REST API base | `https://blockstream.info/api` |
//! | `PRICE_API_URL` | Market-data provider base | `https://api.binance.com/api/v3` |
//! | `FX_API_URL` | Fiat-conversion provider base | `https://app.quidax.io/api/v1` |
//! | `PRICE_TTL_SECS` | Price cache freshness window | `30` |
//! | `PRICE_MAX_STALE_SECS` | Ceiling for serving stale prices | `300` |
//! | `BALANCE_CONCURRENCY` | Max in-flight balance queries | `10` |
//! | `RPC_TIMEOUT_SECS` | Per-call network timeout | `15` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::models::Network;

/// Environment variable name for the symmetric encryption key.
pub const ENC_KEY_ENV: &str = "WALLET_ENC_KEY";

/// Environment variable name for the wallet document store root.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

const DEFAULT_ETHEREUM_RPC_URL: &str = "https://eth.llamarpc.com";
const DEFAULT_BSC_RPC_URL: &str = "https://bsc-dataseed.binance.org";
const DEFAULT_POLYGON_RPC_URL: &str = "https://polygon-rpc.com";
const DEFAULT_BITCOIN_API_URL: &str = "https://blockstream.info/api";
const DEFAULT_PRICE_API_URL: &str = "https://api.binance.com/api/v3";
const DEFAULT_FX_API_URL: &str = "https://app.quidax.io/api/v1";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Immutable application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server bind address.
    pub host: String,
    /// Server bind port.
    pub port: u16,
    /// Root directory for the wallet document store.
    pub data_dir: PathBuf,
    /// 32-byte AES-256 key for the key vault.
    pub encryption_key: [u8; 32],
    /// Ethereum JSON-RPC endpoint.
    pub ethereum_rpc_url: String,
    /// BSC JSON-RPC endpoint.
    pub bsc_rpc_url: String,
    /// Polygon JSON-RPC endpoint.
    pub polygon_rpc_url: String,
    /// Bitcoin REST API base URL.
    pub bitcoin_api_url: String,
    /// Market-data provider base URL.
    pub price_api_url: String,
    /// Fiat-conversion provider base URL.
    pub fx_api_url: String,
    /// Price cache freshness window.
    pub price_ttl: Duration,
    /// Ceiling beyond which stale prices are no longer served.
    pub price_max_stale: Duration,
    /// Maximum concurrent balance queries.
    pub balance_concurrency: usize,
    /// Per-call network timeout for RPC and provider requests.
    pub rpc_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// Fails if `WALLET_ENC_KEY` is absent or malformed; everything else
    /// has a usable default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", "0.0.0.0");
        let port = parse_env("PORT", 8080u16)?;
        let data_dir = PathBuf::from(env_or_default(DATA_DIR_ENV, "./data"));
        let encryption_key = load_encryption_key()?;

        Ok(Self {
            host,
            port,
            data_dir,
            encryption_key,
            ethereum_rpc_url: env_or_default("ETHEREUM_RPC_URL", DEFAULT_ETHEREUM_RPC_URL),
            bsc_rpc_url: env_or_default("BSC_RPC_URL", DEFAULT_BSC_RPC_URL),
            polygon_rpc_url: env_or_default("POLYGON_RPC_URL", DEFAULT_POLYGON_RPC_URL),
            bitcoin_api_url: env_or_default("BITCOIN_API_URL", DEFAULT_BITCOIN_API_URL),
            price_api_url: env_or_default("PRICE_API_URL", DEFAULT_PRICE_API_URL),
            fx_api_url: env_or_default("FX_API_URL", DEFAULT_FX_API_URL),
            price_ttl: Duration::from_secs(parse_env("PRICE_TTL_SECS", 30u64)?),
            price_max_stale: Duration::from_secs(parse_env("PRICE_MAX_STALE_SECS", 300u64)?),
            balance_concurrency: parse_env("BALANCE_CONCURRENCY", 10usize)?,
            rpc_timeout: Duration::from_secs(parse_env("RPC_TIMEOUT_SECS", 15u64)?),
        })
    }

    /// RPC / REST endpoint for a network.
    pub fn rpc_url(&self, network: Network) -> &str {
        match network {
            Network::Ethereum => &self.ethereum_rpc_url,
            Network::Bsc => &self.bsc_rpc_url,
            Network::Polygon => &self.polygon_rpc_url,
            Network::Bitcoin => &self.bitcoin_api_url,
        }
    }
}

/// Parse `WALLET_ENC_KEY` into a 32-byte AES key.
///
/// Accepts a 64-character hex string, or a passphrase of at least 16
/// characters which is run through SHA-256.
fn load_encryption_key() -> Result<[u8; 32], ConfigError> {
    let raw = env::var(ENC_KEY_ENV).map_err(|_| ConfigError::Missing(ENC_KEY_ENV))?;
    derive_encryption_key(&raw)
}

fn derive_encryption_key(raw: &str) -> Result<[u8; 32], ConfigError> {
    let raw = raw.trim();

    if raw.len() == 64 {
        let bytes = hex::decode(raw).map_err(|e| ConfigError::Invalid {
            name: ENC_KEY_ENV,
            reason: format!("not valid hex: {e}"),
        })?;
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        return Ok(key);
    }

    if raw.len() >= 16 {
        let digest = Sha256::digest(raw.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        return Ok(key);
    }

    Err(ConfigError::Invalid {
        name: ENC_KEY_ENV,
        reason: "must be 64 hex chars or a passphrase of at least 16 chars".to_string(),
    })
}

fn env_or_default(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        _ => Ok(default),
    }
}
