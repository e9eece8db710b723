// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path layout for the wallet document store.

use std::path::{Path, PathBuf};

/// Storage path utilities rooted at the configured data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persisted data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory containing all wallet records.
    pub fn wallets_dir(&self) -> PathBuf {
        self.root.join("wallets")
    }

    /// Path to a specific wallet record.
    pub fn wallet(&self, wallet_id: &str) -> PathBuf {
        self.wallets_dir().join(format!("{wallet_id}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_paths_are_correct() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(paths.root(), Path::new("/tmp/test-data"));
        assert_eq!(paths.wallets_dir(), PathBuf::from("/tmp/test-data/wallets"));
        assert_eq!(
            paths.wallet("w1"),
            PathBuf::from("/tmp/test-data/wallets/w1.json")
        );
    }
}
