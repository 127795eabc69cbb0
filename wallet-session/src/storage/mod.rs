//! Durable string key-value storage and the persisted wallet selection.

pub mod file;
pub mod memory;
pub mod selection;

use std::sync::Arc;

use crate::errors::WalletResult;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use selection::SelectionStore;

/// String keyed get/set/remove store. Implementations may fail at any call;
/// callers in this crate treat every failure as non-fatal.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> WalletResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> WalletResult<()>;

    fn remove_item(&self, key: &str) -> WalletResult<()>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;
