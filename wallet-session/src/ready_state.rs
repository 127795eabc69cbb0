//! Derived `wallets` view: one entry per registered adapter paired with the
//! readiness it last reported.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use crate::adapter::{
    AdapterEvent, AdapterEventKind, ListenerId, ReadyState, SharedAdapter, WalletAdapter,
};

#[derive(Clone)]
pub struct WalletEntry {
    pub adapter: SharedAdapter,
    pub ready_state: ReadyState,
}

impl WalletEntry {
    pub fn name(&self) -> &str {
        self.adapter.name()
    }
}

impl fmt::Debug for WalletEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("WalletEntry")
            .field("name", &self.adapter.name())
            .field("ready_state", &self.ready_state)
            .finish()
    }
}

pub type WalletList = Vec<Arc<WalletEntry>>;

/// Called with the adapter name and its new readiness after an entry changes.
pub type ReadyStateListener = Arc<dyn Fn(&str, ReadyState) + Send + Sync>;

struct Subscription {
    adapter: Weak<dyn WalletAdapter>,
    id: ListenerId,
}

struct TrackerInner {
    entries: RwLock<WalletList>,
    subscriptions: Mutex<Vec<Subscription>>,
    listener: RwLock<Option<ReadyStateListener>>,
    publisher: watch::Sender<WalletList>,
}

/// Keeps the `wallets` view in step with adapter readiness notifications.
#[derive(Clone)]
pub struct ReadyStateTracker {
    inner: Arc<TrackerInner>,
}

impl ReadyStateTracker {
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(TrackerInner {
                entries: RwLock::new(Vec::new()),
                subscriptions: Mutex::new(Vec::new()),
                listener: RwLock::new(None),
                publisher,
            }),
        }
    }

    pub fn set_listener(&self, listener: ReadyStateListener) {
        *self.inner.listener.write() = Some(listener);
    }

    /// Replace the tracked adapter list.
    ///
    /// Every listener from the previous list is removed before the new list is
    /// snapshotted and subscribed.
    pub fn track(&self, adapters: &[SharedAdapter]) {
        self.unsubscribe_all();

        let entries: WalletList = adapters
            .iter()
            .map(|adapter| {
                Arc::new(WalletEntry {
                    adapter: Arc::clone(adapter),
                    ready_state: adapter.ready_state(),
                })
            })
            .collect();
        *self.inner.entries.write() = entries.clone();
        self.inner.publisher.send_replace(entries);

        let mut subscriptions = Vec::with_capacity(adapters.len());
        for (index, adapter) in adapters.iter().enumerate() {
            let tracker = Arc::downgrade(&self.inner);
            let id = adapter.on(
                AdapterEventKind::ReadyStateChange,
                Arc::new(move |event| {
                    if let (AdapterEvent::ReadyStateChange(state), Some(inner)) =
                        (event, tracker.upgrade())
                    {
                        TrackerInner::update_entry(&inner, index, *state);
                    }
                }),
            );
            subscriptions.push(Subscription {
                adapter: Arc::downgrade(adapter),
                id,
            });
        }
        *self.inner.subscriptions.lock() = subscriptions;
        log::debug!("Tracking readiness of {} wallet adapters", adapters.len());
    }

    pub fn unsubscribe_all(&self) {
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.lock());
        for subscription in subscriptions {
            if let Some(adapter) = subscription.adapter.upgrade() {
                adapter.off(AdapterEventKind::ReadyStateChange, subscription.id);
            }
        }
    }

    pub fn wallets(&self) -> WalletList {
        self.inner.entries.read().clone()
    }

    pub fn find(&self, name: &str) -> Option<Arc<WalletEntry>> {
        self.inner
            .entries
            .read()
            .iter()
            .find(|entry| entry.name() == name)
            .cloned()
    }

    pub fn ready_state_of(&self, name: &str) -> Option<ReadyState> {
        self.find(name).map(|entry| entry.ready_state)
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletList> {
        self.inner.publisher.subscribe()
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.lock().len()
    }
}

impl Default for ReadyStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadyStateTracker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ReadyStateTracker")
            .field("wallets", &*self.inner.entries.read())
            .finish()
    }
}

impl TrackerInner {
    fn update_entry(inner: &Arc<TrackerInner>, index: usize, ready_state: ReadyState) {
        let (name, snapshot) = {
            let mut entries = inner.entries.write();
            let Some(current) = entries.get(index) else {
                return;
            };
            if current.ready_state == ready_state {
                return;
            }
            let name = current.name().to_string();
            let adapter = Arc::clone(&current.adapter);
            entries[index] = Arc::new(WalletEntry {
                adapter,
                ready_state,
            });
            (name, entries.clone())
        };

        log::debug!("Wallet {} reported readiness {}", name, ready_state);
        inner.publisher.send_replace(snapshot);

        let listener = inner.listener.read().clone();
        if let Some(listener) = listener {
            listener(&name, ready_state);
        }
    }
}
