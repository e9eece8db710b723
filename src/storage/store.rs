// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Filesystem-backed JSON document store.
//!
//! Plain filesystem I/O with atomic writes. Concurrency control is
//! coarse-grained: repositories serialize mutations; reads tolerate
//! concurrent writers because a rename is atomic on POSIX filesystems.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use super::{StoragePaths, StorageError, StorageResult};

/// Document store over one data directory.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    paths: StoragePaths,
    initialized: bool,
}

impl DocumentStore {
    /// Does NOT create the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create the directory structure. Idempotent.
    pub fn initialize(&mut self) -> StorageResult<()> {
        fs::create_dir_all(self.paths.wallets_dir())?;
        self.initialized = true;
        Ok(())
    }

    /// Verify the data directory is writable with a write-read-delete probe.
    pub fn health_check(&self) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let probe = self.paths.root().join(".health_check");
        let data = b"health_check";

        fs::write(&probe, data)?;
        let read_back = fs::read(&probe)?;
        fs::remove_file(&probe)?;

        if read_back != data {
            return Err(StorageError::Io(std::io::Error::other(
                "health check read-back mismatch",
            )));
        }
        Ok(())
    }

    /// Read and deserialize a JSON document.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write a JSON document atomically (temp file + rename).
    pub fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    pub fn delete(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }
        fs::remove_file(path.as_ref())?;
        Ok(())
    }

    /// File stems of all documents with the given extension in a directory.
    pub fn list_files(&self, dir: impl AsRef<Path>, extension: &str) -> StorageResult<Vec<String>> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    fn test_store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::new(StoragePaths::new(dir.path()));
        store.initialize().unwrap();
        (dir, store)
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestDoc {
        id: String,
        value: i32,
    }

    #[test]
    fn initialize_creates_wallets_dir() {
        let (_dir, store) = test_store();
        assert!(store.paths().wallets_dir().exists());
    }

    #[test]
    fn write_and_read_json() {
        let (_dir, store) = test_store();
        let doc = TestDoc {
            id: "doc-1".to_string(),
            value: 42,
        };

        let path = store.paths().wallet("doc-1");
        store.write_json(&path, &doc).unwrap();

        let read: TestDoc = store.read_json(&path).unwrap();
        assert_eq!(read, doc);
        // No temp file left behind after the atomic rename
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn delete_removes_document() {
        let (_dir, store) = test_store();
        let path = store.paths().wallet("gone");
        store
            .write_json(&path, &TestDoc {
                id: "gone".to_string(),
                value: 0,
            })
            .unwrap();

        assert!(store.exists(&path));
        store.delete(&path).unwrap();
        assert!(!store.exists(&path));
    }

    #[test]
    fn list_files_returns_sorted_stems() {
        let (_dir, store) = test_store();
        for id in ["b", "a", "c"] {
            store
                .write_json(
                    store.paths().wallet(id),
                    &TestDoc {
                        id: id.to_string(),
                        value: 1,
                    },
                )
                .unwrap();
        }

        let ids = store.list_files(store.paths().wallets_dir(), "json").unwrap();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn uninitialized_store_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(StoragePaths::new(dir.path()));

        let result = store.read_json::<TestDoc>(dir.path().join("any.json"));
        assert!(matches!(result, Err(StorageError::NotInitialized)));
        assert!(matches!(
            store.health_check(),
            Err(StorageError::NotInitialized)
        ));
    }

    #[test]
    fn health_check_passes_on_writable_dir() {
        let (_dir, store) = test_store();
        store.health_check().unwrap();
    }
}
