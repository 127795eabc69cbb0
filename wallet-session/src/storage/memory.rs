use std::collections::HashMap;

use parking_lot::RwLock;

use super::KeyValueStore;
use crate::errors::WalletResult;

/// Process-local store, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> WalletResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> WalletResult<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> WalletResult<()> {
        self.items.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("walletName").unwrap(), None);

        store.set_item("walletName", "\"Petra\"").unwrap();
        assert_eq!(
            store.get_item("walletName").unwrap().as_deref(),
            Some("\"Petra\"")
        );

        store.remove_item("walletName").unwrap();
        assert!(store.is_empty());
    }
}
