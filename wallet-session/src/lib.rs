// lib.rs - Core library structure for the wallet session

pub mod adapter;
pub mod bridge;
pub mod config;
pub mod errors;
pub mod ready_state;
pub mod registry;
pub mod session;
pub mod storage;
pub mod testing;

/// Build a session from `config`. Equivalent to [`WalletSession::init`].
pub fn init(config: SessionConfig) -> WalletSession {
    WalletSession::init(config)
}

// Re-export common types
pub use adapter::{
    AccountKeys, AdapterEvent, AdapterEventKind, EventEmitter, ListenerId, NetworkInfo,
    ReadyState, SharedAdapter, SignMessagePayload, SignMessageResponse, WalletAdapter,
};
pub use bridge::EventBridge;
pub use config::{ErrorHandler, SessionConfig, SessionOptions, UrlOpener, DEFAULT_STORAGE_KEY};
pub use errors::{WalletError, WalletResult};
pub use ready_state::{ReadyStateTracker, WalletEntry, WalletList};
pub use registry::AdapterRegistry;
pub use session::{Lifecycle, LifecycleToken, SessionSnapshot, WalletSession};
pub use storage::{FileStore, KeyValueStore, MemoryStore, SelectionStore};
