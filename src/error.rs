// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy and HTTP error responses.
//!
//! Component modules raise their own `thiserror` enums; [`EngineError`]
//! wraps them at the orchestration layer and maps onto [`ApiError`] (the
//! JSON `{"error": "..."}` body) at the HTTP boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::chains::AdapterError;
use crate::pricing::PriceError;
use crate::storage::StorageError;
use crate::vault::CryptoError;

/// Engine-level error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed address/network/asset, rejected before any network call
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Wallet id unknown
    #[error("wallet not found: {0}")]
    WalletNotFound(String),

    /// Key material corrupt or vault misconfigured
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Chain adapter failure (timeout, RPC error, bad address)
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Price feed / cache failure
    #[error(transparent)]
    Price(#[from] PriceError),

    /// Wallet document store failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match &err {
            EngineError::InvalidInput(_) => ApiError::bad_request(err.to_string()),
            EngineError::WalletNotFound(_) => ApiError::not_found(err.to_string()),
            EngineError::Crypto(_) => ApiError::internal(err.to_string()),
            EngineError::Adapter(adapter) => match adapter {
                AdapterError::InvalidAddress(_) | AdapterError::UnsupportedAsset { .. } => {
                    ApiError::bad_request(err.to_string())
                }
                AdapterError::Timeout { .. } => ApiError::service_unavailable(err.to_string()),
                AdapterError::Rpc { .. } => ApiError::bad_gateway(err.to_string()),
            },
            EngineError::Price(price) => match price {
                PriceError::UnknownAsset(_) => ApiError::bad_request(err.to_string()),
                _ => ApiError::service_unavailable(err.to_string()),
            },
            EngineError::Storage(storage) => match storage {
                StorageError::NotFound(_) => ApiError::not_found(err.to_string()),
                _ => ApiError::internal(err.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
