// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Document Store
//!
//! JSON documents on the local filesystem, one file per wallet. Writes are
//! atomic (temp file + rename) so a crash mid-write never leaves a torn
//! document behind.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   wallets/
//!     {wallet_id}.json   # Wallet record, key material AES-GCM encrypted
//! ```
//!
//! Private key bytes are encrypted by the [`crate::vault::KeyVault`] before
//! they reach this module; the store itself never sees plaintext keys.

pub mod paths;
pub mod store;
pub mod wallets;

use std::io;

pub use paths::StoragePaths;
pub use store::DocumentStore;
pub use wallets::{WalletRecord, WalletRepository, WalletResponse};

/// Errors raised by the document store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("storage not initialized")]
    NotInitialized,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
