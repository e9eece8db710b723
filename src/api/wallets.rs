// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet lifecycle endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use base64ct::{Base64, Encoding};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::chains::generate_secret_key;
use crate::error::{ApiError, EngineError};
use crate::models::Network;
use crate::state::AppState;
use crate::storage::{StorageError, WalletRecord, WalletRepository, WalletResponse};

/// Request body for wallet generation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateWalletRequest {
    /// Target network: ethereum, bsc, polygon or bitcoin
    pub network: String,
}

/// Generate a new wallet.
///
/// Creates a fresh keypair, derives the network address and persists the
/// record with the private key encrypted. Plaintext key material never
/// leaves this handler.
#[utoipa::path(
    post,
    path = "/v1/wallets/generate",
    tag = "Wallets",
    request_body = GenerateWalletRequest,
    responses(
        (status = 201, description = "Wallet created", body = WalletResponse),
        (status = 400, description = "Unsupported network"),
        (status = 500, description = "Key encryption or storage failure")
    )
)]
pub async fn generate_wallet(
    State(state): State<AppState>,
    Json(request): Json<GenerateWalletRequest>,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    let network: Network = request
        .network
        .parse()
        .map_err(|e: String| ApiError::from(EngineError::InvalidInput(e)))?;

    let secret = generate_secret_key();
    let adapter = state.registry.get(network);
    let address = adapter
        .derive_address(&secret)
        .map_err(|e| ApiError::internal(format!("address derivation failed: {e}")))?;

    let encrypted = state
        .vault
        .encrypt(&secret)
        .map_err(|e| ApiError::from(EngineError::Crypto(e)))?;

    let record = WalletRecord {
        wallet_id: Uuid::new_v4().to_string(),
        network,
        address,
        encrypted_key: Base64::encode_string(&encrypted),
        created_at: Utc::now(),
    };

    let repo = WalletRepository::new(state.store());
    repo.create(&record)
        .map_err(|e| ApiError::from(EngineError::Storage(e)))?;

    info!(wallet_id = %record.wallet_id, %network, address = %record.address, "wallet generated");
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// List all wallets.
#[utoipa::path(
    get,
    path = "/v1/wallets",
    tag = "Wallets",
    responses(
        (status = 200, description = "All wallet records", body = [WalletResponse])
    )
)]
pub async fn list_wallets(
    State(state): State<AppState>,
) -> Result<Json<Vec<WalletResponse>>, ApiError> {
    let repo = WalletRepository::new(state.store());
    let wallets = repo
        .list_all()
        .map_err(|e| ApiError::from(EngineError::Storage(e)))?;
    Ok(Json(wallets.into_iter().map(Into::into).collect()))
}

/// Fetch one wallet by id.
#[utoipa::path(
    get,
    path = "/v1/wallets/{wallet_id}",
    tag = "Wallets",
    params(("wallet_id" = String, Path, description = "Wallet ID")),
    responses(
        (status = 200, description = "Wallet record", body = WalletResponse),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
) -> Result<Json<WalletResponse>, ApiError> {
    let repo = WalletRepository::new(state.store());
    let record = repo
        .get(&wallet_id)
        .map_err(|e| storage_error(&wallet_id, e))?;
    Ok(Json(record.into()))
}

/// Delete a wallet permanently.
///
/// Hard delete: the record and its encrypted key material are removed and
/// cannot be recovered.
#[utoipa::path(
    delete,
    path = "/v1/wallets/{wallet_id}",
    tag = "Wallets",
    params(("wallet_id" = String, Path, description = "Wallet ID")),
    responses(
        (status = 204, description = "Wallet deleted"),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn delete_wallet(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = WalletRepository::new(state.store());
    repo.delete(&wallet_id)
        .map_err(|e| storage_error(&wallet_id, e))?;

    info!(%wallet_id, "wallet deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Map a repository failure through the engine taxonomy.
pub(super) fn storage_error(wallet_id: &str, e: StorageError) -> ApiError {
    match e {
        StorageError::NotFound(_) => EngineError::WalletNotFound(wallet_id.to_string()).into(),
        other => EngineError::Storage(other).into(),
    }
}
