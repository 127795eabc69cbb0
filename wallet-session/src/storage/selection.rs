use super::SharedStore;
use crate::errors::WalletError;

/// Result of reading the persisted selection, before it is collapsed for callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredSelection {
    Found(String),
    Empty,
    Failed(WalletError),
}

/// Best-effort persistence of the selected wallet name.
///
/// Storage failures are logged and absorbed; they never fail a session
/// operation.
#[derive(Clone)]
pub struct SelectionStore {
    key: String,
    backend: Option<SharedStore>,
}

impl SelectionStore {
    pub fn new(key: impl Into<String>, backend: Option<SharedStore>) -> Self {
        Self {
            key: key.into(),
            backend,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn read(&self) -> StoredSelection {
        let Some(backend) = &self.backend else {
            return StoredSelection::Failed(WalletError::StorageUnavailable);
        };

        match backend.get_item(&self.key) {
            Ok(None) => StoredSelection::Empty,
            Ok(Some(raw)) => match serde_json::from_str::<Option<String>>(&raw) {
                Ok(Some(name)) => StoredSelection::Found(name),
                Ok(None) => StoredSelection::Empty,
                Err(err) => StoredSelection::Failed(err.into()),
            },
            Err(err) => StoredSelection::Failed(err),
        }
    }

    pub fn load(&self) -> Option<String> {
        match self.read() {
            StoredSelection::Found(name) => Some(name),
            StoredSelection::Empty => None,
            StoredSelection::Failed(WalletError::StorageUnavailable) => {
                log::debug!("No storage available, starting without a selection");
                None
            }
            StoredSelection::Failed(err) => {
                log::warn!("Could not read stored wallet selection {}: {}", self.key, err);
                None
            }
        }
    }

    pub fn save(&self, name: &str) {
        let Some(backend) = &self.backend else {
            log::debug!("No storage available, selection {} not persisted", name);
            return;
        };

        let outcome = serde_json::to_string(name)
            .map_err(WalletError::from)
            .and_then(|value| backend.set_item(&self.key, &value));
        if let Err(err) = outcome {
            log::warn!("Could not persist wallet selection {}: {}", name, err);
        }
    }

    pub fn clear(&self) {
        let Some(backend) = &self.backend else {
            return;
        };

        if let Err(err) = backend.remove_item(&self.key) {
            log::warn!("Could not clear stored wallet selection: {}", err);
        }
    }
}

impl std::fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SelectionStore")
            .field("key", &self.key)
            .field("available", &self.backend.is_some())
            .finish()
    }
}
