// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet repository.
//!
//! One JSON document per wallet. The private key is stored inside the
//! record as an AES-GCM blob (base64), encrypted by the key vault before
//! it reaches this layer. The encrypted blob is NEVER returned via API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DocumentStore, StorageError, StorageResult};
use crate::models::Network;

/// Persisted wallet record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    /// Unique wallet identifier (UUID)
    pub wallet_id: String,
    /// Network the wallet address lives on
    pub network: Network,
    /// Public address derived from the private key
    pub address: String,
    /// AES-256-GCM encrypted private key, base64 (nonce || ciphertext)
    pub encrypted_key: String,
    /// When the wallet was created
    pub created_at: DateTime<Utc>,
}

/// Wallet view returned to API clients. Never includes key material.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    /// Unique wallet identifier
    pub wallet_id: String,
    /// Network the wallet address lives on
    pub network: Network,
    /// Public address
    pub address: String,
    /// When the wallet was created
    pub created_at: DateTime<Utc>,
}

impl From<WalletRecord> for WalletResponse {
    fn from(record: WalletRecord) -> Self {
        Self {
            wallet_id: record.wallet_id,
            network: record.network,
            address: record.address,
            created_at: record.created_at,
        }
    }
}

/// Repository for wallet records.
pub struct WalletRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> WalletRepository<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    pub fn exists(&self, wallet_id: &str) -> bool {
        self.store.exists(self.store.paths().wallet(wallet_id))
    }

    /// Fetch one wallet record by id.
    pub fn get(&self, wallet_id: &str) -> StorageResult<WalletRecord> {
        let path = self.store.paths().wallet(wallet_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("wallet {wallet_id}")));
        }
        self.store.read_json(path)
    }

    /// Persist a freshly generated wallet.
    pub fn create(&self, record: &WalletRecord) -> StorageResult<()> {
        let wallet_id = &record.wallet_id;
        if self.exists(wallet_id) {
            return Err(StorageError::AlreadyExists(format!("wallet {wallet_id}")));
        }
        self.store
            .write_json(self.store.paths().wallet(wallet_id), record)
    }

    /// Permanently delete a wallet record, key material included.
    pub fn delete(&self, wallet_id: &str) -> StorageResult<()> {
        let path = self.store.paths().wallet(wallet_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("wallet {wallet_id}")));
        }
        self.store.delete(path)
    }

    /// All wallet records, in id order.
    ///
    /// A record that fails to parse is skipped rather than failing the
    /// whole listing; it surfaces again on direct `get`.
    pub fn list_all(&self) -> StorageResult<Vec<WalletRecord>> {
        let ids = self
            .store
            .list_files(self.store.paths().wallets_dir(), "json")?;

        let mut records = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Ok(record) = self.get(id) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;

    fn test_store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::new(StoragePaths::new(dir.path()));
        store.initialize().unwrap();
        (dir, store)
    }

    fn test_record(wallet_id: &str) -> WalletRecord {
        WalletRecord {
            wallet_id: wallet_id.to_string(),
            network: Network::Ethereum,
            address: "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".to_string(),
            encrypted_key: "bm9uY2VfYW5kX2NpcGhlcnRleHQ=".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_get_round_trip() {
        let (_dir, store) = test_store();
        let repo = WalletRepository::new(&store);

        let record = test_record("w-1");
        repo.create(&record).unwrap();

        let loaded = repo.get("w-1").unwrap();
        assert_eq!(loaded.wallet_id, record.wallet_id);
        assert_eq!(loaded.network, Network::Ethereum);
        assert_eq!(loaded.address, record.address);
        assert_eq!(loaded.encrypted_key, record.encrypted_key);
    }

    #[test]
    fn create_duplicate_fails() {
        let (_dir, store) = test_store();
        let repo = WalletRepository::new(&store);

        repo.create(&test_record("w-1")).unwrap();
        assert!(matches!(
            repo.create(&test_record("w-1")),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn get_unknown_wallet_is_not_found() {
        let (_dir, store) = test_store();
        let repo = WalletRepository::new(&store);
        assert!(matches!(
            repo.get("missing"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn delete_is_permanent() {
        let (_dir, store) = test_store();
        let repo = WalletRepository::new(&store);

        repo.create(&test_record("w-1")).unwrap();
        repo.delete("w-1").unwrap();

        assert!(!repo.exists("w-1"));
        assert!(matches!(repo.get("w-1"), Err(StorageError::NotFound(_))));
        assert!(matches!(
            repo.delete("w-1"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn list_all_returns_every_record() {
        let (_dir, store) = test_store();
        let repo = WalletRepository::new(&store);

        for id in ["w-b", "w-a", "w-c"] {
            repo.create(&test_record(id)).unwrap();
        }

        let records = repo.list_all().unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.wallet_id.as_str()).collect();
        assert_eq!(ids, vec!["w-a", "w-b", "w-c"]);
    }

    #[test]
    fn response_view_excludes_key_material() {
        let record = test_record("w-1");
        let response: WalletResponse = record.clone().into();
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("encrypted_key").is_none());
        assert_eq!(json["wallet_id"], "w-1");
        assert_eq!(json["network"], "ethereum");
    }
}
