// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Symmetric encryption of private key material.
//!
//! AES-256-GCM with a process-wide key loaded once at startup. Ciphertext
//! layout is `nonce (12 bytes) || ciphertext+tag`; a fresh random nonce is
//! drawn per encryption. Decryption fails hard on any integrity violation -
//! the vault never returns unauthenticated plaintext.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};

/// GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Errors produced by the key vault.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("encryption key is malformed: {0}")]
    MalformedKey(String),

    #[error("encryption failed: {0}")]
    EncryptFailed(String),

    #[error("decryption failed: ciphertext corrupt or wrong key")]
    DecryptFailed,

    #[error("ciphertext too short to contain a nonce")]
    TruncatedCiphertext,
}

/// Encrypts and decrypts private key blobs with a fixed symmetric key.
#[derive(Clone)]
pub struct KeyVault {
    cipher: Aes256Gcm,
}

impl KeyVault {
    /// Build a vault from a 32-byte key.
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Encrypt plaintext key material. Returns `nonce || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| CryptoError::EncryptFailed(e.to_string()))?;

        let mut blob = nonce.to_vec();
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt a `nonce || ciphertext` blob produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if blob.len() < NONCE_LEN {
            return Err(CryptoError::TruncatedCiphertext);
        }

        let nonce = Nonce::from_slice(&blob[..NONCE_LEN]);
        self.cipher
            .decrypt(nonce, &blob[NONCE_LEN..])
            .map_err(|_| CryptoError::DecryptFailed)
    }
}

impl std::fmt::Debug for KeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("KeyVault").finish_non_exhaustive()
    }
}
