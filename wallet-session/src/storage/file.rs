use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::KeyValueStore;
use crate::errors::{WalletError, WalletResult};

const STORE_VERSION: u16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoreEnvelope {
    version: u16,
    items: BTreeMap<String, String>,
}

/// Key-value store persisted as one JSON document on disk.
///
/// Each mutation rewrites the whole document through a temporary file and a
/// rename, so a crash never leaves a half-written store behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> WalletResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let bytes = fs::read(&self.path)?;
        let envelope: StoreEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version != STORE_VERSION {
            return Err(WalletError::ValidationError(format!(
                "Unsupported store version {}",
                envelope.version
            )));
        }
        Ok(envelope.items)
    }

    fn write_items(&self, items: BTreeMap<String, String>) -> WalletResult<()> {
        let envelope = StoreEnvelope {
            version: STORE_VERSION,
            items,
        };
        let serialized = serde_json::to_vec_pretty(&envelope)?;

        let tmp_path = self.path.with_extension("new");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&serialized)?;
            file.sync_all()?;
        }
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, updater: F) -> WalletResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.lock.lock();
        let mut items = self.read_items()?;
        if updater(&mut items) {
            self.write_items(items)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> WalletResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> WalletResult<()> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove_item(&self, key: &str) -> WalletResult<()> {
        self.update(|items| items.remove(key).is_some())
    }
}
